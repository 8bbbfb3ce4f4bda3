//! Alert message composition
//!
//! A template is plain text with `{{name}}` placeholders. It is parsed once at
//! startup; rendering then substitutes the fields and splits the result into
//! the `To`/`From`/`Subject` headers and the body.

use thiserror::Error;

use crate::domain::{AlertDecision, NotificationMessage};

/// Built-in alert template.
pub const DEFAULT_TEMPLATE: &str = "To: {{mail_to}}\r\n\
From: {{mail_from}}\r\n\
Subject: Price Alert - {{variant_label}} new article!\r\n\
\r\n\
{{variant_label}} market price {{observed_price}} EUR is lower than your reference price {{reference_price}} EUR! See: {{source_url}}\r\n";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unknown placeholder '{{{{{name}}}}}' in notification template")]
    UnknownPlaceholder { name: String },

    #[error("Unterminated placeholder at byte {offset} of notification template")]
    UnterminatedPlaceholder { offset: usize },

    #[error("Notification template is missing the '{header}' header")]
    MissingHeader { header: &'static str },

    #[error("Malformed header line '{line}' in notification template")]
    MalformedHeader { line: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    MailTo,
    MailFrom,
    VariantLabel,
    ObservedPrice,
    ReferencePrice,
    SourceUrl,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "mail_to" => Some(Self::MailTo),
            "mail_from" => Some(Self::MailFrom),
            "variant_label" => Some(Self::VariantLabel),
            "observed_price" => Some(Self::ObservedPrice),
            "reference_price" => Some(Self::ReferencePrice),
            "source_url" => Some(Self::SourceUrl),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Placeholder),
}

/// Values substituted into the template.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationFields<'a> {
    pub mail_to: &'a str,
    pub mail_from: &'a str,
    pub variant_label: &'a str,
    pub observed_price: f64,
    pub reference_price: f64,
    pub source_url: &'a str,
}

impl<'a> NotificationFields<'a> {
    pub fn from_decision(decision: &'a AlertDecision, variant_label: &'a str, mail_to: &'a str, mail_from: &'a str) -> Self {
        Self {
            mail_to,
            mail_from,
            variant_label,
            observed_price: decision.observation.price,
            reference_price: decision.reference_price,
            source_url: &decision.source_url,
        }
    }

    // Shortest decimal form: 35990.0 renders as "35990"
    fn value(&self, placeholder: Placeholder) -> String {
        match placeholder {
            Placeholder::MailTo => self.mail_to.to_string(),
            Placeholder::MailFrom => self.mail_from.to_string(),
            Placeholder::VariantLabel => self.variant_label.to_string(),
            Placeholder::ObservedPrice => self.observed_price.to_string(),
            Placeholder::ReferencePrice => self.reference_price.to_string(),
            Placeholder::SourceUrl => self.source_url.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplate {
    segments: Vec<Segment>,
}

impl NotificationTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after_open = &rest[open + 2..];
            let close = after_open
                .find("}}")
                .ok_or(TemplateError::UnterminatedPlaceholder { offset: offset + open })?;

            let name = after_open[..close].trim();
            if name.contains("{{") {
                return Err(TemplateError::UnterminatedPlaceholder { offset: offset + open });
            }
            let placeholder = Placeholder::from_name(name).ok_or_else(|| TemplateError::UnknownPlaceholder {
                name: name.to_string(),
            })?;
            segments.push(Segment::Field(placeholder));

            let consumed = open + 2 + close + 2;
            rest = &rest[consumed..];
            offset += consumed;
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    #[must_use]
    pub fn render(&self, fields: &NotificationFields<'_>) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Field(placeholder) => fields.value(*placeholder),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct NotificationComposer {
    template: NotificationTemplate,
}

impl NotificationComposer {
    #[must_use]
    pub const fn new(template: NotificationTemplate) -> Self {
        Self { template }
    }

    /// Composer for the configured override, or the built-in template.
    pub fn from_template_source(source: Option<&str>) -> Result<Self, TemplateError> {
        Ok(Self::new(NotificationTemplate::parse(source.unwrap_or(DEFAULT_TEMPLATE))?))
    }

    pub fn compose(&self, fields: &NotificationFields<'_>) -> Result<NotificationMessage, TemplateError> {
        split_message(&self.template.render(fields))
    }
}

fn split_message(rendered: &str) -> Result<NotificationMessage, TemplateError> {
    let normalized = rendered.replace("\r\n", "\n");
    let (head, body) = normalized.split_once("\n\n").unwrap_or((normalized.as_str(), ""));

    let mut to = None;
    let mut from = None;
    let mut subject = None;

    for line in head.lines().filter(|line| !line.trim().is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| TemplateError::MalformedHeader { line: line.to_string() })?;
        let value = value.trim().to_string();
        match name.trim().to_ascii_lowercase().as_str() {
            "to" => to = Some(value),
            "from" => from = Some(value),
            "subject" => subject = Some(value),
            _ => return Err(TemplateError::MalformedHeader { line: line.to_string() }),
        }
    }

    let required = |value: Option<String>, header: &'static str| {
        value
            .filter(|v| !v.is_empty())
            .ok_or(TemplateError::MissingHeader { header })
    };

    Ok(NotificationMessage {
        to: required(to, "To")?,
        from: required(from, "From")?,
        subject: required(subject, "Subject")?,
        body: body.trim_end().to_string(),
    })
}
