//! Presentation layer: typed rule payloads to renderable node trees.
//!
//! Everything here is pure. The engine hands a [`Payload`] to [`render`] and
//! stores the resulting [`Node`] in the region's slot; the node is turned into
//! an HTML fragment (or a redirect directive) only when a snapshot is taken.

use crate::models::{
    CustomerId, CustomerProfile, EligibilityResult, ImageData, Verdict, PROFILE_FIELDS,
};
use url::Url;

pub const NOT_ELIGIBLE_MESSAGE: &str = "You are not eligible for the loan";
pub const ELIGIBLE_MESSAGE: &str = "Congratulations! You are eligible for the loan";
pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "The scoring service is unavailable. Please try again.";
pub const CHART_ERROR_MESSAGE: &str = "Error while generating the chart.";
pub const DRIFT_LINK_LABEL: &str = "Open the drift analysis in a new tab";

/// What a rule produced, before presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Profile {
        id: CustomerId,
        profile: CustomerProfile,
    },
    Prediction {
        id: CustomerId,
        result: EligibilityResult,
    },
    /// The service has no record for this customer.
    NoRecord { id: CustomerId },
    /// A keyed lookup could not reach the service.
    ServiceUnavailable,
    GlobalImage(ImageData),
    GlobalUnavailable,
    /// Navigate the browser to the local interpretation report.
    Redirect(Url),
    DriftLink(Url),
}

/// Renderable tree for one region.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Empty,
    Text(String),
    Element {
        tag: &'static str,
        attrs: Vec<(&'static str, String)>,
        children: Vec<Node>,
    },
    /// Browser navigation directive; renders no markup.
    Redirect(String),
}

impl Node {
    pub fn element(tag: &'static str, children: Vec<Node>) -> Self {
        Node::Element {
            tag,
            attrs: Vec::new(),
            children,
        }
    }

    pub fn text(tag: &'static str, text: impl Into<String>) -> Self {
        Node::element(tag, vec![Node::Text(text.into())])
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        if let Node::Element { attrs, .. } = &mut self {
            attrs.push((name, value.into()));
        }
        self
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Node::Redirect(href) => Some(href),
            _ => None,
        }
    }

    /// Concatenated text of the tree, without markup.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
            Node::Empty | Node::Redirect(_) => {}
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Empty | Node::Redirect(_) => {}
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::Element {
                tag,
                attrs,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_html(value));
                    out.push('"');
                }
                out.push('>');
                if is_void(tag) {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "img" | "br" | "hr")
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn verdict_message(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Eligible => ELIGIBLE_MESSAGE,
        Verdict::NotEligible => NOT_ELIGIBLE_MESSAGE,
    }
}

pub fn no_record_message(id: &CustomerId) -> String {
    format!("No client found with ID: {}", id)
}

pub fn render(payload: &Payload) -> Node {
    match payload {
        Payload::Profile { id, profile } => render_profile(id, profile),
        Payload::Prediction { id, result } => Node::element(
            "div",
            vec![
                Node::text(
                    "p",
                    format!(
                        "The probability that client {} repays the credit is: {}%",
                        id,
                        result.probability()
                    ),
                ),
                Node::element(
                    "p",
                    vec![Node::text("strong", verdict_message(result.verdict()))],
                ),
            ],
        ),
        Payload::NoRecord { id } => {
            Node::element("div", vec![Node::text("h3", no_record_message(id))])
        }
        Payload::ServiceUnavailable => {
            Node::element("div", vec![Node::text("p", SERVICE_UNAVAILABLE_MESSAGE)])
        }
        Payload::GlobalImage(image) => Node::element("img", Vec::new())
            .attr("src", image.data_uri())
            .attr("alt", "Global interpretation")
            .attr("style", "width: 100%; height: auto"),
        Payload::GlobalUnavailable => Node::Text(CHART_ERROR_MESSAGE.to_string()),
        Payload::Redirect(url) => Node::Redirect(url.to_string()),
        Payload::DriftLink(url) => Node::text("a", DRIFT_LINK_LABEL)
            .attr("href", url.as_str())
            .attr("target", "_blank")
            .attr("rel", "noopener"),
    }
}

fn render_profile(id: &CustomerId, profile: &CustomerProfile) -> Node {
    let columns = PROFILE_FIELDS
        .chunks(4)
        .enumerate()
        .map(|(i, fields)| {
            let items = fields
                .iter()
                .map(|field| {
                    Node::text("li", format!("{} : {}", field.label, profile.display(field.key)))
                })
                .collect();
            let style = if i + 1 < PROFILE_FIELDS.len() / 4 {
                "flex: 1; margin-right: 10px"
            } else {
                "flex: 1"
            };
            Node::element("div", vec![Node::element("ul", items)]).attr("style", style)
        })
        .collect();

    Node::element(
        "div",
        vec![
            Node::text("h3", format!("Client information: {}", id))
                .attr("style", "text-align: center"),
            Node::element("div", columns).attr("style", "display: flex; flex-wrap: wrap"),
        ],
    )
}
