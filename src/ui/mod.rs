// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Top-level egui application shell for reviewing registrations.
//! Handles layout, the command worker pool, and session subscription wiring.

pub mod components;

use std::collections::VecDeque;
use std::time::Duration;

use chrono::Utc;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use tracing::error;

use crate::logic::routes::{Page, Resolution};
use crate::models::session::SessionSnapshot;
use crate::mvu::{self, AppModel, Command, Msg, Services};
use crate::session::Subscription;
use crate::ui::components::{auth_form, dashboard};

/// Stateful egui application driving the MVU kernel.
pub struct InscricoesApp {
    model: AppModel,
    inbox: VecDeque<Msg>,
    cmd_tx: Sender<Command>,
    msg_rx: Receiver<Msg>,
    session_rx: Receiver<SessionSnapshot>,
    /// Keeps the session store feeding `session_rx`; dropped with the app.
    _subscription: Subscription,
}

impl InscricoesApp {
    pub fn new(ctx: &egui::Context, services: Services, mut model: AppModel) -> Self {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<Command>();
        let (msg_tx, msg_rx) = crossbeam_channel::unbounded::<Msg>();
        let (session_tx, session_rx) = crossbeam_channel::unbounded::<SessionSnapshot>();

        let subscription = {
            let ctx = ctx.clone();
            services.session.subscribe(move |snapshot| {
                let _ = session_tx.send(snapshot.clone());
                ctx.request_repaint();
            })
        };

        let threads = std::thread::available_parallelism()
            .map(|n| n.get().clamp(2, 4))
            .unwrap_or(2);
        for _ in 0..threads {
            let cmd_rx = cmd_rx.clone();
            let msg_tx = msg_tx.clone();
            let services = services.clone();
            let ctx = ctx.clone();
            std::thread::spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        error!("Failed to start worker runtime: {err}");
                        return;
                    }
                };
                for cmd in cmd_rx.iter() {
                    let msg = runtime.block_on(mvu::run_command(&services, cmd));
                    if msg_tx.send(msg).is_err() {
                        break;
                    }
                    ctx.request_repaint();
                }
            });
        }

        let mut commands = Vec::new();
        mvu::init(&mut model, &mut commands);

        let mut app = Self {
            model,
            inbox: VecDeque::new(),
            cmd_tx,
            msg_rx,
            session_rx,
            _subscription: subscription,
        };
        app.dispatch(commands);
        app
    }

    fn dispatch(&mut self, commands: Vec<Command>) {
        for cmd in commands {
            if self.cmd_tx.send(cmd).is_ok() {
                self.model.pending_commands += 1;
            }
        }
    }
}

impl eframe::App for InscricoesApp {
    /// Drives a single UI frame.
    ///
    /// Session snapshots are queued ahead of worker replies, then every queued
    /// message is applied in arrival order before the current page is
    /// rendered. Messages produced while rendering are handled next frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_spacing(ctx);

        while let Ok(snapshot) = self.session_rx.try_recv() {
            self.inbox.push_back(Msg::SessionChanged(snapshot));
        }
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.model.pending_commands = self.model.pending_commands.saturating_sub(1);
            self.inbox.push_back(msg);
        }
        if self.model.refresh_due(Utc::now()) {
            self.inbox.push_back(Msg::RefreshDue);
        }

        while let Some(msg) = self.inbox.pop_front() {
            let mut commands = Vec::new();
            mvu::update(&mut self.model, msg, &mut commands);
            self.dispatch(commands);
        }

        if let Some(deadline) = self.model.refresh_deadline() {
            let wait = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            ctx.request_repaint_after(wait);
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("Inscrições FutVôlei");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.render_theme_controls(ui);
                    self.render_user(ui);
                });
            });
            ui.add_space(4.0);
        });

        self.render_error_modal(ctx);

        egui::TopBottomPanel::bottom("status_panel")
            .resizable(false)
            .show(ctx, |ui| {
                self.render_status(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(8.0);
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| self.render_page(ui));
        });

        if !self.inbox.is_empty() {
            ctx.request_repaint();
        }
    }

    // Required by eframe 0.34; all rendering happens in `update`, which
    // eframe still invokes before `ui` each frame.
    fn ui(&mut self, _ui: &mut egui::Ui, _frame: &mut eframe::Frame) {}
}

impl InscricoesApp {
    fn ensure_spacing(&self, ctx: &egui::Context) {
        ctx.style_mut(|style| {
            style.spacing.item_spacing = egui::vec2(6.0, 6.0);
        });
    }

    fn render_theme_controls(&mut self, ui: &mut egui::Ui) {
        ui.add_space(2.0);
        egui::widgets::global_theme_preference_switch(ui);
    }

    /// Signed-in account, when there is one.
    fn render_user(&self, ui: &mut egui::Ui) {
        let Some(user) = &self.model.session.user else {
            return;
        };
        ui.separator();
        let label = user.email.as_deref().unwrap_or(&user.id);
        ui.label(
            egui::RichText::new(format!("{} {label}", egui_phosphor::regular::USER_CIRCLE))
                .color(egui::Color32::from_gray(110)),
        );
    }

    fn render_page(&mut self, ui: &mut egui::Ui) {
        match self.model.resolution() {
            Resolution::Render(Page::Login) => {
                let msgs = auth_form::view(ui, &self.model.login);
                self.inbox.extend(msgs.into_iter().map(Msg::Login));
            }
            Resolution::Render(Page::Signup) => {
                let msgs = auth_form::view(ui, &self.model.signup);
                self.inbox.extend(msgs.into_iter().map(Msg::Signup));
            }
            Resolution::Render(Page::Dashboard) => {
                let msgs = dashboard::view(
                    ui,
                    &self.model.dashboard,
                    self.model.session.user.as_ref(),
                );
                self.inbox.extend(msgs.into_iter().map(Msg::Dashboard));
            }
            // Redirects are settled by the kernel; show the placeholder meanwhile.
            Resolution::Loading | Resolution::Redirect(_) => {
                ui.horizontal(|ui| {
                    ui.add(egui::Spinner::new().size(16.0));
                    ui.label("Carregando...");
                });
            }
        }
    }

    /// Render a simple modal window for error messages.
    fn render_error_modal(&mut self, ctx: &egui::Context) {
        if let Some(message) = self.model.error.clone() {
            egui::Window::new("Erro")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        self.inbox.push_back(Msg::DismissError);
                    }
                });
        }
    }

    /// Render latest status message when present.
    fn render_status(&self, ui: &mut egui::Ui) {
        let pending = self.model.pending_commands;
        let text = match (&self.model.status, pending) {
            (Some(text), 0) => text.clone(),
            (Some(text), n) => format!("{text}  ({n} em andamento…)"),
            (None, 0) => return,
            (None, n) => format!("{n} em andamento…"),
        };
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(text).color(egui::Color32::from_gray(68)));
            if pending > 0 {
                ui.add(egui::Spinner::new().size(14.0))
                    .on_hover_text(format!("{pending} tarefa(s) em segundo plano"));
            }
        });
    }
}
