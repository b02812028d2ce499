// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Sign-in and sign-up forms.

use eframe::egui;
use email_address::EmailAddress;
use secrecy::SecretString;

pub const MISSING_FIELDS: &str = "Por favor, preencha todos os campos.";
pub const INVALID_EMAIL: &str = "Informe um email válido.";
pub const SHORT_PASSWORD: &str = "A senha deve ter pelo menos 6 caracteres.";
pub const SIGNUP_SUCCESS: &str = "Cadastro realizado! Verifique seu email para confirmar.";

/// Provider-enforced minimum.
const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthFormKind {
    #[default]
    Login,
    Signup,
}

impl AuthFormKind {
    fn title(self) -> &'static str {
        match self {
            Self::Login => "Entrar",
            Self::Signup => "Criar Conta",
        }
    }

    fn submit_label(self, submitting: bool) -> &'static str {
        match (self, submitting) {
            (Self::Login, false) => "Entrar",
            (Self::Login, true) => "Entrando...",
            (Self::Signup, false) => "Cadastrar",
            (Self::Signup, true) => "Criando conta...",
        }
    }

    fn switch_prompt(self) -> (&'static str, &'static str) {
        match self {
            Self::Login => ("Não tem conta?", "Cadastre-se"),
            Self::Signup => ("Já tem conta?", "Entrar"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthFormModel {
    pub kind: AuthFormKind,
    pub email: String,
    pub password: String,
    pub submitting: bool,
    pub error: Option<String>,
    /// Informational line shown above the form (e.g. after sign-up).
    pub notice: Option<String>,
}

impl AuthFormModel {
    pub fn new(kind: AuthFormKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthFormMsg {
    EmailChanged(String),
    PasswordChanged(String),
    Submit,
    /// Provider answer for the submitted credentials; `Err` carries the provider message.
    Completed(Result<(), String>),
    SwitchForm,
}

pub enum AuthFormCommand {
    SignIn {
        email: String,
        password: SecretString,
    },
    SignUp {
        email: String,
        password: SecretString,
    },
}

/// Outcomes the kernel reacts to with navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthFormEvent {
    Succeeded,
    SwitchRequested,
}

pub fn update(
    model: &mut AuthFormModel,
    msg: AuthFormMsg,
    cmds: &mut Vec<AuthFormCommand>,
) -> Option<AuthFormEvent> {
    match msg {
        AuthFormMsg::EmailChanged(text) => model.email = text,
        AuthFormMsg::PasswordChanged(text) => model.password = text,
        AuthFormMsg::Submit => {
            if model.submitting {
                return None;
            }
            model.notice = None;
            match validate(model) {
                Err(message) => model.error = Some(message.to_string()),
                Ok(email) => {
                    model.error = None;
                    model.submitting = true;
                    let password = SecretString::new(model.password.clone());
                    cmds.push(match model.kind {
                        AuthFormKind::Login => AuthFormCommand::SignIn { email, password },
                        AuthFormKind::Signup => AuthFormCommand::SignUp { email, password },
                    });
                }
            }
        }
        AuthFormMsg::Completed(result) => {
            model.submitting = false;
            match result {
                Ok(()) => {
                    model.password.clear();
                    model.error = None;
                    return Some(AuthFormEvent::Succeeded);
                }
                Err(message) => model.error = Some(message),
            }
        }
        AuthFormMsg::SwitchForm => {
            model.error = None;
            return Some(AuthFormEvent::SwitchRequested);
        }
    }
    None
}

/// Returns the trimmed email when the form may be submitted.
fn validate(model: &AuthFormModel) -> Result<String, &'static str> {
    let email = model.email.trim();
    if email.is_empty() || model.password.is_empty() {
        return Err(MISSING_FIELDS);
    }
    if model.kind == AuthFormKind::Signup {
        if !EmailAddress::is_valid(email) {
            return Err(INVALID_EMAIL);
        }
        if model.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(SHORT_PASSWORD);
        }
    }
    Ok(email.to_string())
}

pub fn view(ui: &mut egui::Ui, model: &AuthFormModel) -> Vec<AuthFormMsg> {
    let mut msgs = Vec::new();

    ui.vertical_centered(|ui| {
        ui.add_space(24.0);
        ui.heading(egui::RichText::new("FutVôlei").size(32.0).strong());
        ui.label("Gerenciamento de Inscrições");
        ui.add_space(20.0);

        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(320.0);
            ui.heading(model.kind.title());
            ui.add_space(8.0);

            if let Some(notice) = &model.notice {
                ui.label(egui::RichText::new(notice).color(egui::Color32::from_rgb(46, 125, 50)));
                ui.add_space(6.0);
            }
            if let Some(error) = &model.error {
                ui.label(egui::RichText::new(error).color(egui::Color32::from_rgb(198, 40, 40)));
                ui.add_space(6.0);
            }

            ui.add_enabled_ui(!model.submitting, |ui| {
                ui.label("Email");
                let mut email = model.email.clone();
                if ui
                    .add(egui::TextEdit::singleline(&mut email).desired_width(f32::INFINITY))
                    .changed()
                {
                    msgs.push(AuthFormMsg::EmailChanged(email));
                }

                ui.add_space(4.0);
                ui.label("Senha");
                let mut password = model.password.clone();
                let response = ui.add(
                    egui::TextEdit::singleline(&mut password)
                        .password(true)
                        .desired_width(f32::INFINITY),
                );
                if response.changed() {
                    msgs.push(AuthFormMsg::PasswordChanged(password));
                }
                let enter =
                    response.lost_focus() && ui.input(|inp| inp.key_pressed(egui::Key::Enter));

                ui.add_space(10.0);
                let button = egui::Button::new(model.kind.submit_label(model.submitting))
                    .min_size(egui::vec2(ui.available_width(), 32.0));
                if ui.add(button).clicked() || enter {
                    msgs.push(AuthFormMsg::Submit);
                }
            });
        });

        ui.add_space(10.0);
        let (prompt, link) = model.kind.switch_prompt();
        ui.horizontal(|ui| {
            ui.label(prompt);
            if ui.link(link).clicked() {
                msgs.push(AuthFormMsg::SwitchForm);
            }
        });
    });

    msgs
}
