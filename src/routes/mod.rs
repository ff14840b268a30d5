use actix_session::Session;
use actix_web::HttpResponse;
use actix_web::http::header;
use actix_web_flash_messages::{FlashMessage, Level};
use lazy_static::lazy_static;
use log::error;
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};

use crate::domain::SelectedFile;
use crate::services::ports::{Modal, Notification, NotificationStatus, Notifier};
use crate::services::submission::UploadState;

pub mod main;

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        match Tera::new("templates/**/*") {
            Ok(t) => t,
            Err(e) => {
                println!("Parsing error(s): {}", e);
                ::std::process::exit(1);
            }
        }
    };
}

const FORM_SESSION_KEY: &str = "add_image";

/// Per-browser copy of the form's local state between requests.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FormSession {
    pub upload: UploadState,
    pub image: Option<SelectedFile>,
    pub image_error: Option<String>,
}

impl FormSession {
    pub fn load(session: &Session) -> Self {
        match session.get::<Self>(FORM_SESSION_KEY) {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                log::warn!("Discarding unreadable form session: {e}");
                Self::default()
            }
        }
    }

    pub fn store(&self, session: &Session) {
        if let Err(e) = session.insert(FORM_SESSION_KEY, self) {
            error!("Failed to store form session: {e}");
        }
    }
}

/// Notifications delivered as flash messages on the next page render.
pub struct FlashNotifier;

impl Notifier for FlashNotifier {
    fn notify(&self, notification: Notification) {
        let level = match notification.status {
            NotificationStatus::Default => Level::Info,
            NotificationStatus::Warning => Level::Warning,
            NotificationStatus::Error => Level::Error,
        };
        FlashMessage::new(
            format!("{} {}", notification.title, notification.description),
            level,
        )
        .send();
    }
}

/// Whether the add-image modal should be shown after the request.
#[derive(Debug)]
pub struct ModalState {
    open: bool,
}

impl ModalState {
    pub fn open() -> Self {
        Self { open: true }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Modal for ModalState {
    fn close(&mut self) {
        self.open = false;
    }
}

fn alert_level_to_str(level: &Level) -> &'static str {
    match level {
        Level::Error => "danger",
        Level::Warning => "warning",
        Level::Success => "success",
        _ => "info",
    }
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn render_template(template: &str, context: &Context) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(TEMPLATES.render(template, context).unwrap_or_else(|e| {
            error!("Failed to render template {}': {}", template, e);
            String::new()
        }))
}
