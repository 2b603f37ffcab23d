//! Event topics
//!
//! Internally every subscription and publish is keyed by [`Topic`], a
//! structured value. The colon-delimited string forms are parsed and
//! rendered only at the external boundary.

/// Per-connection message asking to end an active overlay
///
/// This is a connection-level request topic, not a bus topic; see
/// [`OverlayBroker::handle_message`](crate::OverlayBroker::handle_message).
pub const END_OVERLAY_MESSAGE: &str = "endOverlay";

/// Which overlay trigger a topic addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    /// Show the overlay (`overlay:<name>:show`)
    Show,
    /// Hide every active instance of the overlay (`overlay:<name>:hide`)
    Hide,
    /// Notify that an overlay ended (`overlay:<name>:end`)
    End,
}

impl TriggerKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "show" => Some(TriggerKind::Show),
            "hide" => Some(TriggerKind::Hide),
            "end" => Some(TriggerKind::End),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Show => "show",
            TriggerKind::Hide => "hide",
            TriggerKind::End => "end",
        }
    }
}

/// A bus topic
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Register one or many overlay definitions (`overlays:add`)
    AddOverlays,
    /// The layout-partitioned snapshot pushed to displays (`overlays:state`)
    ///
    /// Outbound only; publishing to it has no subscribers inside the broker.
    State,
    /// A named overlay trigger (`overlay:<name>:show|hide|end`)
    Overlay {
        /// Definition name the trigger addresses
        name: String,
        /// Trigger kind
        trigger: TriggerKind,
    },
}

impl Topic {
    /// Show trigger topic for an overlay name
    pub fn show(name: impl Into<String>) -> Self {
        Topic::Overlay {
            name: name.into(),
            trigger: TriggerKind::Show,
        }
    }

    /// Hide trigger topic for an overlay name
    pub fn hide(name: impl Into<String>) -> Self {
        Topic::Overlay {
            name: name.into(),
            trigger: TriggerKind::Hide,
        }
    }

    /// End notification topic for an overlay name
    pub fn end(name: impl Into<String>) -> Self {
        Topic::Overlay {
            name: name.into(),
            trigger: TriggerKind::End,
        }
    }

    /// Parse the string wire form of a topic
    ///
    /// Returns `None` for anything that is not a recognized topic, including
    /// `overlay::show` (empty name).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "overlays:add" => return Some(Topic::AddOverlays),
            "overlays:state" => return Some(Topic::State),
            _ => {}
        }

        let rest = s.strip_prefix("overlay:")?;
        let (name, trigger) = rest.rsplit_once(':')?;
        if name.is_empty() {
            return None;
        }
        Some(Topic::Overlay {
            name: name.to_string(),
            trigger: TriggerKind::parse(trigger)?,
        })
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::AddOverlays => write!(f, "overlays:add"),
            Topic::State => write!(f, "overlays:state"),
            Topic::Overlay { name, trigger } => {
                write!(f, "overlay:{}:{}", name, trigger.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_topics() {
        assert_eq!(Topic::parse("overlays:add"), Some(Topic::AddOverlays));
        assert_eq!(Topic::parse("overlays:state"), Some(Topic::State));
        assert_eq!(Topic::parse("overlay:sub:show"), Some(Topic::show("sub")));
        assert_eq!(Topic::parse("overlay:sub:hide"), Some(Topic::hide("sub")));
        assert_eq!(Topic::parse("overlay:raid:end"), Some(Topic::end("raid")));
    }

    #[test]
    fn test_parse_name_with_colons() {
        // Only the last segment is the trigger
        assert_eq!(
            Topic::parse("overlay:a:b:show"),
            Some(Topic::show("a:b"))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Topic::parse(""), None);
        assert_eq!(Topic::parse("overlay:sub"), None);
        assert_eq!(Topic::parse("overlay:sub:explode"), None);
        assert_eq!(Topic::parse("overlay::show"), None);
        assert_eq!(Topic::parse("overlays:remove"), None);
    }

    #[test]
    fn test_display_round_trip() {
        for topic in [
            Topic::AddOverlays,
            Topic::State,
            Topic::show("alert"),
            Topic::hide("alert"),
            Topic::end("alert"),
        ] {
            assert_eq!(Topic::parse(&topic.to_string()), Some(topic));
        }
    }
}
