// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Registrations dashboard: fetch lifecycle, render rule and card routing.
//!
//! Every fetch is tagged with a generation number. Only the result of the
//! most recently issued fetch is applied; unmounting bumps the generation so
//! that results arriving afterwards are dropped.

use std::collections::HashMap;

use eframe::egui;
use tracing::debug;

use crate::config::MessagingConfig;
use crate::models::registration::{Registration, RegistrationId};
use crate::models::session::User;
use crate::ui::components::registration_card::{self, CardCommand, CardModel, CardMsg};

pub const LOADING_TEXT: &str = "Carregando inscrições...";
pub const EMPTY_TEXT: &str = "Você ainda não tem inscrições.";
pub const FAILED_TEXT: &str = "Não foi possível carregar as inscrições.";

const CLOSED_CARD: CardModel = CardModel { preview: None };

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Loading,
    Ready,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardModel {
    phase: Phase,
    /// Last applied fetch result; failure text kept apart from "no records".
    outcome: Result<Vec<Registration>, String>,
    generation: u64,
    identity: Option<String>,
    mounted: bool,
    cards: HashMap<RegistrationId, CardModel>,
    messaging: MessagingConfig,
}

impl Default for DashboardModel {
    fn default() -> Self {
        Self::new(MessagingConfig::default())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DashboardMsg {
    Mounted {
        identity: Option<String>,
    },
    SessionChanged {
        identity: Option<String>,
    },
    Loaded {
        generation: u64,
        result: Result<Vec<Registration>, String>,
    },
    Unmounted,
    Retry,
    SignOutRequested,
    Card {
        id: RegistrationId,
        msg: CardMsg,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DashboardCommand {
    FetchRegistrations { generation: u64 },
    SignOut,
    OpenLink(String),
}

/// What the body of the dashboard shows.
#[derive(Debug, PartialEq, Eq)]
pub enum DashboardContent<'a> {
    Loading,
    Empty,
    Failed(&'a str),
    Cards(&'a [Registration]),
}

impl DashboardModel {
    pub fn new(messaging: MessagingConfig) -> Self {
        Self {
            phase: Phase::Loading,
            outcome: Ok(Vec::new()),
            generation: 0,
            identity: None,
            mounted: false,
            cards: HashMap::new(),
            messaging,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn card(&self, id: &RegistrationId) -> &CardModel {
        self.cards.get(id).unwrap_or(&CLOSED_CARD)
    }

    /// Card state for the row at `index`. Rows repeating an earlier id share
    /// that row's state but never draw its overlay.
    fn card_for_row(&self, records: &[Registration], index: usize) -> &CardModel {
        let id = &records[index].id;
        if records[..index].iter().any(|r| &r.id == id) {
            &CLOSED_CARD
        } else {
            self.card(id)
        }
    }

    fn start_fetch(&mut self, cmds: &mut Vec<DashboardCommand>) {
        self.generation += 1;
        self.phase = Phase::Loading;
        cmds.push(DashboardCommand::FetchRegistrations {
            generation: self.generation,
        });
    }
}

/// Pure render rule.
pub fn content(model: &DashboardModel) -> DashboardContent<'_> {
    match (model.phase, &model.outcome) {
        (Phase::Loading, _) => DashboardContent::Loading,
        (Phase::Ready, Err(message)) => DashboardContent::Failed(message),
        (Phase::Ready, Ok(records)) if records.is_empty() => DashboardContent::Empty,
        (Phase::Ready, Ok(records)) => DashboardContent::Cards(records),
    }
}

/// Apply a message. Returns a status line when there is something to report.
pub fn update(
    model: &mut DashboardModel,
    msg: DashboardMsg,
    cmds: &mut Vec<DashboardCommand>,
) -> Option<String> {
    match msg {
        DashboardMsg::Mounted { identity } => {
            model.mounted = true;
            model.identity = identity;
            model.start_fetch(cmds);
            None
        }
        DashboardMsg::SessionChanged { identity } => {
            if !model.mounted || model.identity == identity {
                return None;
            }
            model.identity = identity;
            model.cards.clear();
            model.start_fetch(cmds);
            None
        }
        DashboardMsg::Loaded { generation, result } => {
            if !model.mounted || generation != model.generation {
                debug!(
                    generation,
                    current = model.generation,
                    "Discarding stale registrations result"
                );
                return None;
            }
            model.phase = Phase::Ready;
            let status = match &result {
                Ok(records) => {
                    model
                        .cards
                        .retain(|id, _| records.iter().any(|r| &r.id == id));
                    format!("{} inscrição(ões) carregada(s).", records.len())
                }
                Err(err) => {
                    model.cards.clear();
                    format!("{FAILED_TEXT} {err}")
                }
            };
            model.outcome = result;
            Some(status)
        }
        DashboardMsg::Unmounted => {
            model.mounted = false;
            model.generation += 1;
            model.cards.clear();
            None
        }
        DashboardMsg::Retry => {
            if model.mounted {
                model.start_fetch(cmds);
            }
            None
        }
        DashboardMsg::SignOutRequested => {
            cmds.push(DashboardCommand::SignOut);
            None
        }
        DashboardMsg::Card { id, msg } => {
            let Ok(records) = &model.outcome else {
                return None;
            };
            let Some(registration) = records.iter().find(|r| r.id == id) else {
                return None;
            };
            let mut card_cmds = Vec::new();
            let card = model.cards.entry(id).or_default();
            registration_card::update(card, msg, registration, &model.messaging, &mut card_cmds);
            for c in card_cmds {
                match c {
                    CardCommand::OpenLink(url) => cmds.push(DashboardCommand::OpenLink(url)),
                }
            }
            None
        }
    }
}

/// Render header and body; `user` is the signed-in account, if any.
pub fn view(ui: &mut egui::Ui, model: &DashboardModel, user: Option<&User>) -> Vec<DashboardMsg> {
    let mut msgs = Vec::new();

    ui.horizontal(|ui| {
        let name = user.map(User::display_name).unwrap_or_default();
        ui.heading(format!("Bem-vindo, {name}!"));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let button = egui::Button::new(format!("{} Sair", egui_phosphor::regular::SIGN_OUT));
            if ui.add(button).clicked() {
                msgs.push(DashboardMsg::SignOutRequested);
            }
        });
    });
    ui.label(
        egui::RichText::new("Você está logado.")
            .italics()
            .color(egui::Color32::from_gray(110)),
    );
    ui.separator();
    ui.add_space(8.0);

    match content(model) {
        DashboardContent::Loading => {
            ui.horizontal(|ui| {
                ui.add(egui::Spinner::new().size(16.0));
                ui.label(LOADING_TEXT);
            });
        }
        DashboardContent::Empty => {
            ui.label(EMPTY_TEXT);
        }
        DashboardContent::Failed(message) => {
            ui.label(
                egui::RichText::new(FAILED_TEXT)
                    .strong()
                    .color(egui::Color32::from_rgb(198, 40, 40)),
            );
            ui.label(
                egui::RichText::new(message)
                    .small()
                    .color(egui::Color32::from_gray(110)),
            );
            ui.add_space(6.0);
            if ui
                .button(format!(
                    "{} Tentar novamente",
                    egui_phosphor::regular::ARROW_CLOCKWISE
                ))
                .clicked()
            {
                msgs.push(DashboardMsg::Retry);
            }
        }
        DashboardContent::Cards(records) => {
            ui.heading("Inscrições");
            ui.add_space(6.0);
            for (index, registration) in records.iter().enumerate() {
                ui.push_id((index, registration.id.as_str()), |ui| {
                    let card = model.card_for_row(records, index);
                    let card_msgs = registration_card::view(ui, registration, card);
                    msgs.extend(card_msgs.into_iter().map(|msg| DashboardMsg::Card {
                        id: registration.id.clone(),
                        msg,
                    }));
                });
                ui.add_space(16.0);
            }
        }
    }

    msgs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::registration::tests::sample;
    use crate::ui::components::registration_card::PreviewImage;

    fn mounted() -> (DashboardModel, u64) {
        let mut model = DashboardModel::default();
        let mut cmds = Vec::new();
        update(
            &mut model,
            DashboardMsg::Mounted {
                identity: Some("u1".into()),
            },
            &mut cmds,
        );
        let generation = match cmds.as_slice() {
            [DashboardCommand::FetchRegistrations { generation }] => *generation,
            other => panic!("unexpected commands: {other:?}"),
        };
        (model, generation)
    }

    fn loaded(model: &mut DashboardModel, generation: u64, result: Result<Vec<Registration>, String>) {
        update(
            model,
            DashboardMsg::Loaded { generation, result },
            &mut Vec::new(),
        );
    }

    #[test]
    fn mount_shows_loading_and_fetches() {
        let (model, generation) = mounted();

        assert_eq!(generation, 1);
        assert!(model.is_mounted());
        assert_eq!(content(&model), DashboardContent::Loading);
    }

    #[test]
    fn empty_result_is_empty_not_failed() {
        let (mut model, generation) = mounted();

        loaded(&mut model, generation, Ok(Vec::new()));

        assert_eq!(model.phase, Phase::Ready);
        assert_eq!(content(&model), DashboardContent::Empty);
    }

    #[test]
    fn failure_is_rendered_distinctly_and_retry_refetches() {
        let (mut model, generation) = mounted();
        loaded(&mut model, generation, Err("timeout".into()));
        assert_eq!(content(&model), DashboardContent::Failed("timeout"));

        let mut cmds = Vec::new();
        update(&mut model, DashboardMsg::Retry, &mut cmds);

        assert_eq!(
            cmds,
            vec![DashboardCommand::FetchRegistrations { generation: 2 }]
        );
        assert_eq!(content(&model), DashboardContent::Loading);
    }

    #[test]
    fn cards_follow_backend_order() {
        let (mut model, generation) = mounted();
        let records = vec![sample(3, "1"), sample(1, "2"), sample(2, "3")];

        loaded(&mut model, generation, Ok(records.clone()));

        match content(&model) {
            DashboardContent::Cards(shown) => assert_eq!(shown, records.as_slice()),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn stale_result_is_ignored() {
        let (mut model, first) = mounted();
        let mut cmds = Vec::new();
        update(
            &mut model,
            DashboardMsg::SessionChanged {
                identity: Some("u2".into()),
            },
            &mut cmds,
        );
        assert_eq!(
            cmds,
            vec![DashboardCommand::FetchRegistrations { generation: 2 }]
        );

        loaded(&mut model, first, Ok(vec![sample(9, "1")]));
        assert_eq!(content(&model), DashboardContent::Loading);

        loaded(&mut model, 2, Ok(vec![sample(1, "1")]));
        match content(&model) {
            DashboardContent::Cards(shown) => assert_eq!(shown[0].id.as_str(), "1"),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn same_identity_does_not_refetch() {
        let (mut model, _) = mounted();
        let mut cmds = Vec::new();

        update(
            &mut model,
            DashboardMsg::SessionChanged {
                identity: Some("u1".into()),
            },
            &mut cmds,
        );

        assert!(cmds.is_empty());
        assert_eq!(model.generation, 1);
    }

    #[test]
    fn result_after_unmount_is_dropped() {
        let (mut model, generation) = mounted();

        update(&mut model, DashboardMsg::Unmounted, &mut Vec::new());
        loaded(&mut model, generation, Ok(vec![sample(1, "1")]));

        assert!(!model.is_mounted());
        assert_eq!(model.phase, Phase::Loading);
    }

    #[test]
    fn card_messages_route_to_matching_record() {
        let (mut model, generation) = mounted();
        loaded(
            &mut model,
            generation,
            Ok(vec![sample(1, "11988887777"), sample(2, "21977776666")]),
        );
        let id = sample(2, "x").id;

        let mut cmds = Vec::new();
        update(
            &mut model,
            DashboardMsg::Card {
                id: id.clone(),
                msg: CardMsg::OpenPreview(PreviewImage::PaymentProof),
            },
            &mut cmds,
        );
        update(
            &mut model,
            DashboardMsg::Card {
                id: id.clone(),
                msg: CardMsg::OpenConfirmation,
            },
            &mut cmds,
        );

        assert_eq!(model.card(&id).preview, Some(PreviewImage::PaymentProof));
        assert!(model.card(&sample(1, "x").id).preview.is_none());
        match cmds.as_slice() {
            [DashboardCommand::OpenLink(url)] => {
                assert!(url.starts_with("https://wa.me/5521977776666?text="))
            }
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[test]
    fn refetch_drops_state_of_vanished_cards() {
        let (mut model, generation) = mounted();
        loaded(&mut model, generation, Ok(vec![sample(1, "1"), sample(2, "2")]));
        for id in [sample(1, "1").id, sample(2, "2").id] {
            update(
                &mut model,
                DashboardMsg::Card {
                    id,
                    msg: CardMsg::OpenPreview(PreviewImage::PairPhoto),
                },
                &mut Vec::new(),
            );
        }

        let mut cmds = Vec::new();
        update(&mut model, DashboardMsg::Retry, &mut cmds);
        let generation = model.generation;
        loaded(&mut model, generation, Ok(vec![sample(2, "2")]));

        assert!(model.card(&sample(1, "1").id).preview.is_none());
        assert_eq!(
            model.card(&sample(2, "2").id).preview,
            Some(PreviewImage::PairPhoto)
        );
    }

    #[test]
    fn sign_out_request_keeps_records() {
        let (mut model, generation) = mounted();
        loaded(&mut model, generation, Ok(vec![sample(1, "1")]));
        let mut cmds = Vec::new();

        update(&mut model, DashboardMsg::SignOutRequested, &mut cmds);

        assert_eq!(cmds, vec![DashboardCommand::SignOut]);
        assert!(matches!(content(&model), DashboardContent::Cards(_)));
    }

    #[test]
    fn duplicate_ids_draw_a_single_overlay() {
        let (mut model, generation) = mounted();
        let records = vec![sample(5, "1"), sample(6, "2"), sample(5, "3")];
        loaded(&mut model, generation, Ok(records.clone()));
        update(
            &mut model,
            DashboardMsg::Card {
                id: records[0].id.clone(),
                msg: CardMsg::OpenPreview(PreviewImage::PairPhoto),
            },
            &mut Vec::new(),
        );

        assert_eq!(
            model.card_for_row(&records, 0).preview,
            Some(PreviewImage::PairPhoto)
        );
        assert!(model.card_for_row(&records, 1).preview.is_none());
        assert!(model.card_for_row(&records, 2).preview.is_none());
    }
}
