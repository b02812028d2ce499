// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Card showing one registration, with an enlarged-image overlay and the
//! confirmation link.

use eframe::egui;
use url::Url;

use crate::config::MessagingConfig;
use crate::logic::registration::{
    confirmation_link, format_submitted_at, image_use_label, is_image_use_authorized,
};
use crate::models::registration::Registration;

const THUMBNAIL_SIZE: egui::Vec2 = egui::vec2(300.0, 225.0);
const PREVIEW_SIZE: egui::Vec2 = egui::vec2(960.0, 720.0);

/// Which of the two record images is enlarged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewImage {
    PairPhoto,
    PaymentProof,
}

impl PreviewImage {
    pub fn title(self) -> &'static str {
        match self {
            Self::PairPhoto => "Foto da Dupla",
            Self::PaymentProof => "Comprovante",
        }
    }

    fn source(self, registration: &Registration) -> &str {
        match self {
            Self::PairPhoto => &registration.photo,
            Self::PaymentProof => &registration.payment_proof,
        }
    }
}

/// Local UI state of a card. The overlay is open iff `preview` is set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardModel {
    pub preview: Option<PreviewImage>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CardMsg {
    OpenPreview(PreviewImage),
    ClosePreview,
    /// Click on the enlarged image itself; must not close the overlay.
    PreviewImageClicked,
    OpenConfirmation,
}

/// Side effects requested by a card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CardCommand {
    OpenLink(String),
}

pub fn update(
    model: &mut CardModel,
    msg: CardMsg,
    registration: &Registration,
    messaging: &MessagingConfig,
    cmds: &mut Vec<CardCommand>,
) {
    match msg {
        CardMsg::OpenPreview(image) => model.preview = Some(image),
        CardMsg::ClosePreview => model.preview = None,
        CardMsg::PreviewImageClicked => {}
        CardMsg::OpenConfirmation => {
            cmds.push(CardCommand::OpenLink(confirmation_link(
                registration,
                messaging,
            )));
        }
    }
}

/// Render the card and its overlay (when open).
pub fn view(ui: &mut egui::Ui, registration: &Registration, model: &CardModel) -> Vec<CardMsg> {
    let mut msgs = Vec::new();

    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_max_width(700.0);
        render_details(ui, registration);
        ui.add_space(12.0);

        ui.horizontal_wrapped(|ui| {
            for image in [PreviewImage::PairPhoto, PreviewImage::PaymentProof] {
                ui.vertical(|ui| {
                    ui.strong(image.title());
                    if render_image(ui, image.source(registration), THUMBNAIL_SIZE)
                        .is_some_and(|resp| resp.clicked())
                    {
                        msgs.push(CardMsg::OpenPreview(image));
                    }
                });
            }
        });

        ui.add_space(12.0);
        let button = egui::Button::new(
            egui::RichText::new(format!(
                "{} Confirmar Inscrição",
                egui_phosphor::regular::WHATSAPP_LOGO
            ))
            .strong(),
        )
        .min_size(egui::vec2(ui.available_width(), 36.0));
        if ui
            .add(button)
            .on_hover_text("Abrir mensagem de confirmação no WhatsApp")
            .clicked()
        {
            msgs.push(CardMsg::OpenConfirmation);
        }
    });

    if let Some(image) = model.preview {
        render_overlay(ui.ctx(), registration, image, &mut msgs);
    }

    msgs
}

fn render_details(ui: &mut egui::Ui, registration: &Registration) {
    let authorized = is_image_use_authorized(registration.authorize_image_use.as_deref());
    let submitted_at = format_submitted_at(&registration.submitted_at, &chrono::Local);

    egui::Grid::new("registration_details")
        .num_columns(2)
        .striped(true)
        .spacing(egui::vec2(14.0, 8.0))
        .min_col_width(120.0)
        .show(ui, |ui| {
            let rows = [
                ("Categoria", registration.category.as_str()),
                ("Atleta 1", registration.athlete1_name.as_str()),
                ("CPF", registration.athlete1_cpf.as_str()),
                ("Atleta 2", registration.athlete2_name.as_str()),
                ("CPF", registration.athlete2_cpf.as_str()),
                ("Telefone", registration.phone.as_str()),
                ("Data", submitted_at.as_str()),
            ];
            for (label, value) in rows {
                ui.strong(label);
                ui.label(value);
                ui.end_row();
            }

            ui.strong("Uso de Imagem");
            let color = if authorized {
                egui::Color32::from_rgb(46, 125, 50)
            } else {
                egui::Color32::from_rgb(198, 40, 40)
            };
            ui.label(
                egui::RichText::new(image_use_label(
                    registration.authorize_image_use.as_deref(),
                ))
                .strong()
                .color(color),
            );
            ui.end_row();
        });
}

/// Draw a remote image, or a placeholder when `source` is not a URL.
///
/// The image senses clicks; the placeholder does not.
fn render_image(
    ui: &mut egui::Ui,
    source: &str,
    max_size: egui::Vec2,
) -> Option<egui::Response> {
    if Url::parse(source).is_err() {
        ui.label(
            egui::RichText::new(format!("{} Imagem indisponível", egui_phosphor::regular::IMAGE))
                .italics()
                .color(egui::Color32::from_gray(110)),
        );
        return None;
    }

    let image = egui::Image::new(source.to_string())
        .max_size(max_size)
        .maintain_aspect_ratio(true)
        .corner_radius(8.0)
        .sense(egui::Sense::click());
    Some(ui.add(image).on_hover_cursor(egui::CursorIcon::PointingHand))
}

fn render_overlay(
    ctx: &egui::Context,
    registration: &Registration,
    image: PreviewImage,
    msgs: &mut Vec<CardMsg>,
) {
    let id = egui::Id::new(("registration_preview", registration.id.as_str()));
    let response = egui::Modal::new(id).show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading(image.title());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .button(egui_phosphor::regular::X)
                    .on_hover_text("Fechar")
                    .clicked()
                {
                    msgs.push(CardMsg::ClosePreview);
                }
            });
        });
        ui.add_space(8.0);

        if let Some(resp) = render_image(ui, image.source(registration), PREVIEW_SIZE)
            && resp.clicked()
        {
            msgs.push(CardMsg::PreviewImageClicked);
        }
    });

    // Backdrop click or Escape.
    if response.should_close() && !msgs.contains(&CardMsg::ClosePreview) {
        msgs.push(CardMsg::ClosePreview);
    }
}
