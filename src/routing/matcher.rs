//! Path classification.
//!
//! # Responsibilities
//! - Recognise the room-creation path (exact match, optional prefix)
//! - Recognise room-scoped paths and extract the room id
//! - Pick the forwarding scheme for each shape
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Segment parsing, no regex, anchored at the start of the path
//! - Room ids are unsigned decimal; anything else is a routing miss

use crate::http::forward::ForwardScheme;

/// What an inbound path asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// `{prefix}/room`
    CreateRoom,
    /// `/room/<id>(/...)`
    RoomAction(u64),
    /// `/ws/<id>`
    RoomConnection(u64),
}

impl RouteTarget {
    /// Forwarding handle used for this target.
    pub fn scheme(&self) -> ForwardScheme {
        match self {
            RouteTarget::CreateRoom | RouteTarget::RoomConnection(_) => ForwardScheme::Plain,
            RouteTarget::RoomAction(_) => ForwardScheme::Upgraded,
        }
    }

    /// Room addressed by this target, if any.
    pub fn room_id(&self) -> Option<u64> {
        match self {
            RouteTarget::CreateRoom => None,
            RouteTarget::RoomAction(id) | RouteTarget::RoomConnection(id) => Some(*id),
        }
    }
}

/// Classifies request paths.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    creation_path: String,
}

impl RouteMatcher {
    pub fn new(api_prefix: &str) -> Self {
        Self {
            creation_path: format!("{}/room", api_prefix),
        }
    }

    /// The exact room-creation path.
    pub fn creation_path(&self) -> &str {
        &self.creation_path
    }

    /// Classify `path`, or `None` for a routing miss.
    pub fn classify(&self, path: &str) -> Option<RouteTarget> {
        if path == self.creation_path {
            return Some(RouteTarget::CreateRoom);
        }

        let mut segments = path.strip_prefix('/')?.split('/');
        let kind = segments.next()?;
        let room_id = parse_room_id(segments.next()?)?;

        match kind {
            "room" => Some(RouteTarget::RoomAction(room_id)),
            "ws" if segments.next().is_none() => Some(RouteTarget::RoomConnection(room_id)),
            _ => None,
        }
    }
}

fn parse_room_id(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
