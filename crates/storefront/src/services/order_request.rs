//! Wholesale order requests.
//!
//! Shoppers who prefer not to pay online can send the cart contents to the
//! sales team as a pre-filled email or WhatsApp message. Composing the
//! message is pure; opening the link is delegated to an [`OrderChannel`].

use std::fmt::Write as _;
use std::sync::Mutex;

use aurelia_core::{Language, Price};
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::cart::LineView;
use crate::filters::format_price;

/// WhatsApp click-to-chat base URL.
const WHATSAPP_BASE_URL: &str = "https://wa.me/";

/// Errors that can occur when sending an order request.
#[derive(Debug, Error)]
pub enum OrderRequestError {
    /// There is nothing to request.
    #[error("Cart is empty")]
    EmptyCart,

    /// The composed link is not a valid URL.
    #[error("Invalid link: {0}")]
    InvalidLink(#[from] url::ParseError),

    /// The channel refused the link.
    #[error("Channel error: {0}")]
    Channel(String),
}

/// Where to send the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderVia {
    /// A `mailto:` link to the sales inbox.
    Email,
    /// A `wa.me` chat link with the message prefilled.
    WhatsApp,
}

/// One requested item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequestLine {
    pub name: String,
    pub quantity: u32,
    pub pack_label: String,
}

/// A composed order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub lang: Language,
    pub lines: Vec<OrderRequestLine>,
    pub subtotal: Price,
    /// The formatted message text.
    pub body: String,
}

impl OrderRequest {
    /// Build the message for resolved cart lines.
    ///
    /// Variant labels are appended to the product name.
    #[must_use]
    pub fn compose(lines: &[LineView], subtotal: Price, lang: Language) -> Self {
        let lines: Vec<OrderRequestLine> = lines
            .iter()
            .map(|l| OrderRequestLine {
                name: l
                    .variant_label
                    .as_ref()
                    .map_or_else(|| l.name.clone(), |v| format!("{} - {v}", l.name)),
                quantity: l.quantity,
                pack_label: l.pack_label.clone(),
            })
            .collect();

        let (greeting, subtotal_label) = match lang {
            Language::Es => (
                "Hola, me gustaría solicitar el siguiente pedido mayorista:",
                "Subtotal",
            ),
            Language::Ko => ("안녕하세요, 다음 도매 주문을 요청합니다:", "소계"),
        };

        let mut body = String::from(greeting);
        body.push_str("\n\n");
        for line in &lines {
            // Writing to a String cannot fail.
            let _ = writeln!(body, "- {} ({}) x{}", line.name, line.pack_label, line.quantity);
        }
        let _ = write!(body, "\n{subtotal_label}: {}", format_price(subtotal, lang));

        Self {
            lang,
            lines,
            subtotal,
            body,
        }
    }

    /// Whether the request lists no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `mailto:` link with subject and body pre-filled.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLink` if the address produces an invalid URL.
    pub fn mailto_link(&self, to: &str, subject: &str) -> Result<Url, OrderRequestError> {
        let link = format!(
            "mailto:{to}?subject={}&body={}",
            urlencoding::encode(subject),
            urlencoding::encode(&self.body)
        );
        Ok(Url::parse(&link)?)
    }

    /// WhatsApp click-to-chat link with the body pre-filled.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLink` if the number produces an invalid URL.
    pub fn whatsapp_link(&self, number: &str) -> Result<Url, OrderRequestError> {
        let mut url = Url::parse(WHATSAPP_BASE_URL)?.join(number)?;
        url.set_query(Some(&format!("text={}", urlencoding::encode(&self.body))));
        Ok(url)
    }

    /// Default email subject for `lang`.
    #[must_use]
    pub const fn default_subject(lang: Language) -> &'static str {
        match lang {
            Language::Es => "Solicitud de pedido mayorista",
            Language::Ko => "도매 주문 요청",
        }
    }
}

/// Outbound side effect that opens a composed link.
pub trait OrderChannel: Send + Sync {
    /// Open the link (mail client, chat app). Nothing is read back.
    ///
    /// # Errors
    ///
    /// Returns `Channel` if the link could not be handed off.
    fn open(&self, link: &Url) -> Result<(), OrderRequestError>;
}

/// Channel that keeps every link it is given.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    opened: Mutex<Vec<Url>>,
}

impl RecordingChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Links opened so far, oldest first.
    #[must_use]
    pub fn opened(&self) -> Vec<Url> {
        self.opened
            .lock()
            .map(|links| links.clone())
            .unwrap_or_default()
    }
}

impl OrderChannel for RecordingChannel {
    fn open(&self, link: &Url) -> Result<(), OrderRequestError> {
        self.opened
            .lock()
            .map_err(|_| OrderRequestError::Channel("recording lock poisoned".to_string()))?
            .push(link.clone());
        Ok(())
    }
}
