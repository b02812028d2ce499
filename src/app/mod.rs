// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Application entry point wiring egui/eframe to launch the registrations UI.

use crate::mvu::{AppModel, Services};
use crate::ui::InscricoesApp;
use eframe::egui;
use egui_phosphor::Variant;

/// Bootstrap the desktop application and run the main egui event loop.
pub fn run(services: Services, model: AppModel) -> eframe::Result<()> {
    // Register Phosphor icon font.
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, Variant::Regular);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Inscrições FutVôlei")
            .with_inner_size([1024.0, 800.0])
            .with_min_inner_size([480.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Inscrições FutVôlei",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_fonts(fonts);
            // Registration photos are remote URLs.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(InscricoesApp::new(&cc.egui_ctx, services, model)))
        }),
    )
}
