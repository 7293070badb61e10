//! Parsed component identifier and its wire codec

use std::fmt;

use compact_str::{CompactString, ToCompactString};
use smallvec::SmallVec;

use crate::error::{IdError, IdResult};

/// Segment separator of the wire form.
pub const DELIMITER: char = ':';

/// Transport limit for a component custom id, in characters.
pub const MAX_ID_LENGTH: usize = 100;

/// Which kind of handler an identifier is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingKind {
    /// Durable, name-addressed handler (`sc`)
    Stateless,

    /// Ephemeral callback stored in memory (`cb`)
    Callback,

    /// Not produced by this codec
    Unknown,
}

impl RoutingKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Stateless => "sc",
            Self::Callback => "cb",
            Self::Unknown => "",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "sc" => Self::Stateless,
            "cb" => Self::Callback,
            _ => Self::Unknown,
        }
    }
}

/// The interactive element an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Button,
    StringSelect,
    EntitySelect,
    Modal,
    Unknown,
}

impl ComponentKind {
    pub const ALL: [Self; 5] = [
        Self::Button,
        Self::StringSelect,
        Self::EntitySelect,
        Self::Modal,
        Self::Unknown,
    ];

    /// Dense index into per-kind tables, in `ALL` order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Button => 0,
            Self::StringSelect => 1,
            Self::EntitySelect => 2,
            Self::Modal => 3,
            Self::Unknown => 4,
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Button => "btn",
            Self::StringSelect => "sel",
            Self::EntitySelect => "ent",
            Self::Modal => "mdl",
            Self::Unknown => "",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "btn" => Self::Button,
            "sel" => Self::StringSelect,
            "ent" => Self::EntitySelect,
            "mdl" => Self::Modal,
            _ => Self::Unknown,
        }
    }
}

/// Immutable, decoded form of a component custom id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentId {
    routing: RoutingKind,
    kind: ComponentKind,
    identity: CompactString,
    payload: Option<CompactString>,
}

impl ComponentId {
    /// Decode a raw wire string. Never fails.
    ///
    /// Input with fewer than three segments is treated as foreign and comes
    /// back as `Unknown`/`Unknown` with the raw string as identity.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::unknown(CompactString::default());
        }

        let mut parts = raw.splitn(4, DELIMITER);
        let (Some(routing), Some(kind), Some(identity)) = (parts.next(), parts.next(), parts.next())
        else {
            return Self::unknown(raw.to_compact_string());
        };

        Self {
            routing: RoutingKind::from_code(routing),
            kind: ComponentKind::from_code(kind),
            identity: identity.to_compact_string(),
            payload: normalize_payload(parts.next()),
        }
    }

    /// Identifier routed to a durable handler registered under `identity`.
    #[must_use]
    pub fn stateless(kind: ComponentKind, identity: &str, payload: Option<&str>) -> Self {
        Self::new(RoutingKind::Stateless, kind, identity, payload)
    }

    /// Identifier routed to the stored callback `callback_id`.
    #[must_use]
    pub fn callback(kind: ComponentKind, callback_id: &str, payload: Option<&str>) -> Self {
        Self::new(RoutingKind::Callback, kind, callback_id, payload)
    }

    fn new(routing: RoutingKind, kind: ComponentKind, identity: &str, payload: Option<&str>) -> Self {
        Self {
            routing,
            kind,
            identity: identity.to_compact_string(),
            payload: normalize_payload(payload),
        }
    }

    fn unknown(identity: CompactString) -> Self {
        Self {
            routing: RoutingKind::Unknown,
            kind: ComponentKind::Unknown,
            identity,
            payload: None,
        }
    }

    /// Produce the wire string, enforcing the transport length limit.
    pub fn encode(&self) -> IdResult<String> {
        if self.routing == RoutingKind::Unknown || self.kind == ComponentKind::Unknown {
            return Err(IdError::UnknownKind);
        }
        if self.identity.is_empty() {
            return Err(IdError::EmptyIdentity);
        }
        if self.identity.contains(DELIMITER) {
            return Err(IdError::DelimiterInIdentity(self.identity.clone()));
        }

        let raw = self.to_string();
        let length = raw.chars().count();
        if length > MAX_ID_LENGTH {
            return Err(IdError::LimitExceeded {
                length,
                limit: MAX_ID_LENGTH,
            });
        }

        Ok(raw)
    }

    #[must_use]
    pub const fn routing(&self) -> RoutingKind {
        self.routing
    }

    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Handler name or callback id.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// Whether this identifier was produced by this codec and may be routed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.routing != RoutingKind::Unknown
            && self.kind != ComponentKind::Unknown
            && !self.identity.is_empty()
    }

    #[must_use]
    pub fn is_callback(&self) -> bool {
        self.routing == RoutingKind::Callback
    }

    #[must_use]
    pub fn is_stateless(&self) -> bool {
        self.routing == RoutingKind::Stateless
    }

    #[must_use]
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

/// Wire form without the length check; use [`ComponentId::encode`] for output.
impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            self.routing.code(),
            self.kind.code(),
            self.identity
        )?;
        if let Some(payload) = &self.payload {
            write!(f, "{DELIMITER}{payload}")?;
        }
        Ok(())
    }
}

fn normalize_payload(payload: Option<&str>) -> Option<CompactString> {
    payload
        .filter(|p| !p.is_empty())
        .map(CompactString::from)
}

/// Split payload data into segments, dropping trailing empty segments.
///
/// `"close:123:"` yields `["close", "123"]`; an empty input yields nothing.
#[must_use]
pub fn split_segments<'a>(data: &'a str, delimiter: &str) -> SmallVec<[&'a str; 4]> {
    let mut parts: SmallVec<[&'a str; 4]> = if delimiter.is_empty() {
        smallvec::smallvec![data]
    } else {
        data.split(delimiter).collect()
    };

    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stateless_id_with_payload() {
        let id = ComponentId::parse("sc:btn:confirm-delete:123");

        assert_eq!(id.routing(), RoutingKind::Stateless);
        assert_eq!(id.kind(), ComponentKind::Button);
        assert_eq!(id.identity(), "confirm-delete");
        assert_eq!(id.payload(), Some("123"));
        assert!(id.is_valid());
    }

    #[test]
    fn payload_keeps_inner_delimiters() {
        let id = ComponentId::parse("cb:mdl:f7e8d9c0:user:456");

        assert!(id.is_callback());
        assert_eq!(id.kind(), ComponentKind::Modal);
        assert_eq!(id.identity(), "f7e8d9c0");
        assert_eq!(id.payload(), Some("user:456"));
    }

    #[test]
    fn short_input_is_foreign() {
        for raw in ["legacy", "a:b", "button_ok"] {
            let id = ComponentId::parse(raw);
            assert_eq!(id.routing(), RoutingKind::Unknown);
            assert_eq!(id.kind(), ComponentKind::Unknown);
            assert_eq!(id.identity(), raw);
            assert!(!id.is_valid());
        }

        let empty = ComponentId::parse("");
        assert_eq!(empty.identity(), "");
        assert!(!empty.is_valid());
    }

    #[test]
    fn unrecognized_codes_map_to_unknown() {
        let id = ComponentId::parse("somebot:legacy:foo");

        assert_eq!(id.routing(), RoutingKind::Unknown);
        assert_eq!(id.kind(), ComponentKind::Unknown);
        assert!(!id.is_valid());

        let half = ComponentId::parse("sc:xyz:foo");
        assert_eq!(half.routing(), RoutingKind::Stateless);
        assert_eq!(half.kind(), ComponentKind::Unknown);
        assert!(!half.is_valid());
    }

    #[test]
    fn empty_identity_is_not_valid() {
        assert!(!ComponentId::parse("sc:btn::data").is_valid());
    }

    #[test]
    fn empty_payload_segment_is_absent() {
        let id = ComponentId::parse("sc:sel:role-picker:");
        assert_eq!(id.payload(), None);
        assert_eq!(id.encode().unwrap(), "sc:sel:role-picker");
    }

    #[test]
    fn payload_from_constructor_is_owned_and_normalized() {
        let id = ComponentId::stateless(ComponentKind::Button, "page", Some("2:next"));
        assert_eq!(id.payload(), Some("2:next"));
        assert!(id.has_payload());

        let empty = ComponentId::callback(ComponentKind::Modal, "a1b2c3d4", Some(""));
        assert_eq!(empty.payload(), None);
        assert!(!empty.has_payload());
    }

    #[test]
    fn encode_omits_missing_payload() {
        let id = ComponentId::callback(ComponentKind::Button, "a1b2c3d4", None);
        assert_eq!(id.encode().unwrap(), "cb:btn:a1b2c3d4");

        let empty = ComponentId::stateless(ComponentKind::EntitySelect, "pick", Some(""));
        assert_eq!(empty.encode().unwrap(), "sc:ent:pick");
    }

    #[test]
    fn round_trips_through_wire_form() {
        let ids = [
            ComponentId::stateless(ComponentKind::Button, "ticket-close", Some("123:pending")),
            ComponentId::callback(ComponentKind::Modal, "Zx81ab9Q", None),
            ComponentId::stateless(ComponentKind::StringSelect, "role-picker", Some("a")),
        ];

        for id in ids {
            let raw = id.encode().unwrap();
            assert_eq!(ComponentId::parse(&raw), id);
        }
    }

    #[test]
    fn encode_accepts_exactly_the_limit() {
        // "sc:btn:" is 7 characters
        let identity = "x".repeat(MAX_ID_LENGTH - 7);
        let id = ComponentId::stateless(ComponentKind::Button, &identity, None);

        assert_eq!(id.encode().unwrap().len(), MAX_ID_LENGTH);
    }

    #[test]
    fn encode_rejects_one_past_the_limit() {
        let identity = "x".repeat(MAX_ID_LENGTH - 7);
        let id = ComponentId::stateless(ComponentKind::Button, &identity, Some("y"));

        // + ":y"
        assert_eq!(
            id.encode(),
            Err(IdError::LimitExceeded {
                length: MAX_ID_LENGTH + 2,
                limit: MAX_ID_LENGTH,
            })
        );
    }

    #[test]
    fn encode_rejects_identities_that_would_not_round_trip() {
        let empty = ComponentId::stateless(ComponentKind::Button, "", None);
        assert_eq!(empty.encode(), Err(IdError::EmptyIdentity));

        let split = ComponentId::stateless(ComponentKind::Button, "a:b", None);
        assert!(matches!(split.encode(), Err(IdError::DelimiterInIdentity(_))));

        let unknown = ComponentId::stateless(ComponentKind::Unknown, "a", None);
        assert_eq!(unknown.encode(), Err(IdError::UnknownKind));
    }

    #[test]
    fn display_matches_wire_form() {
        let id = ComponentId::parse("cb:sel:q1w2e3r4:page:2");
        assert_eq!(id.to_string(), "cb:sel:q1w2e3r4:page:2");
    }

    #[test]
    fn split_drops_trailing_empty_segments() {
        assert_eq!(split_segments("close:123:pending", ":").as_slice(), [
            "close", "123", "pending"
        ]);
        assert_eq!(split_segments("a::b::", ":").as_slice(), ["a", "", "b"]);
        assert!(split_segments("", ":").is_empty());
        assert_eq!(split_segments("a|b", "|").as_slice(), ["a", "b"]);
    }
}
