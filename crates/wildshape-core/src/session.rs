//! Per-client panel state: who is acting, what is selected, what is pending.

use wildshape_geometry::Vec2;

use crate::ids::TokenId;
use crate::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    Gm,
    #[default]
    Player,
}

impl Role {
    /// Host role string; only "GM" (any case) is a game master
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("gm") {
            Role::Gm
        } else {
            Role::Player
        }
    }
}

/// Panel tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Shapes,
    Summons,
    Library,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Shapes, Tab::Summons, Tab::Library];

    pub fn visible_for(self, role: Role) -> bool {
        !(self == Tab::Library && role == Role::Player)
    }

    pub fn visible(role: Role) -> impl Iterator<Item = Tab> {
        Self::ALL.into_iter().filter(move |t| t.visible_for(role))
    }
}

/// Request left by a context menu for the panel to pick up on open
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRequest {
    pub tab: Tab,
    pub token: Option<TokenId>,
}

/// What the current selection allows
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionStatus {
    Nothing,
    NotImage,
    /// Can be reverted; cannot be added to the library
    Transformed { id: TokenId },
    /// Can be added to the library
    Pristine { id: TokenId, url: String },
}

impl SelectionStatus {
    /// Classify by the first selected token
    pub fn classify(selected: &[Token]) -> Self {
        match selected.first() {
            None => SelectionStatus::Nothing,
            Some(Token::Other(_)) => SelectionStatus::NotImage,
            Some(Token::Image(t)) if t.image.url.is_empty() => SelectionStatus::NotImage,
            Some(Token::Image(t)) if t.is_transformed() => SelectionStatus::Transformed { id: t.id.clone() },
            Some(Token::Image(t)) => SelectionStatus::Pristine {
                id: t.id.clone(),
                url: t.image.url.clone(),
            },
        }
    }

    pub fn can_revert(&self) -> bool {
        matches!(self, SelectionStatus::Transformed { .. })
    }

    pub fn can_save(&self) -> bool {
        matches!(self, SelectionStatus::Pristine { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub player_name: Option<String>,
    pub role: Role,
    pending_summon: Option<Vec2>,
    open_request: Option<OpenRequest>,
}

impl Session {
    pub fn new(player_name: Option<String>, role: Role) -> Self {
        Self {
            player_name,
            role,
            ..Self::default()
        }
    }

    /// Remember where the map was right-clicked
    pub fn set_pending_summon(&mut self, position: Vec2) {
        self.pending_summon = Some(position);
    }

    pub fn take_pending_summon(&mut self) -> Option<Vec2> {
        self.pending_summon.take()
    }

    pub fn pending_summon(&self) -> Option<Vec2> {
        self.pending_summon
    }

    pub fn request_open(&mut self, tab: Tab, token: Option<TokenId>) {
        self.open_request = Some(OpenRequest { tab, token });
    }

    /// Consume the pending open request, dropping it if the role cannot see the tab
    pub fn take_open_request(&mut self) -> Option<OpenRequest> {
        self.open_request.take().filter(|r| r.tab.visible_for(self.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{ImageToken, Layer, OtherToken};

    #[test]
    fn role_parsing() {
        assert_eq!(Role::parse("GM"), Role::Gm);
        assert_eq!(Role::parse(" gm "), Role::Gm);
        assert_eq!(Role::parse("PLAYER"), Role::Player);
        assert_eq!(Role::parse(""), Role::Player);
    }

    #[test]
    fn players_do_not_see_the_library() {
        assert!(!Tab::Library.visible_for(Role::Player));
        assert_eq!(Tab::visible(Role::Player).count(), 2);
        assert_eq!(Tab::visible(Role::Gm).count(), 3);
    }

    #[test]
    fn classify_selection() {
        assert_eq!(SelectionStatus::classify(&[]), SelectionStatus::Nothing);

        let text = OtherToken {
            id: "t".into(),
            layer: Layer::Other("TEXT".into()),
            position: Vec2::ZERO,
            label: "note".into(),
        };
        assert_eq!(SelectionStatus::classify(&[text.into()]), SelectionStatus::NotImage);

        let img = ImageToken::new("i".into(), "a.png", 10.0, 10.0, 10.0);
        let status = SelectionStatus::classify(&[img.into()]);
        assert!(status.can_save());
        assert!(!status.can_revert());
    }

    #[test]
    fn pending_summon_is_consumed_once() {
        let mut session = Session::new(Some("Sam".into()), Role::Player);
        session.set_pending_summon(Vec2::new(1.0, 2.0));
        assert_eq!(session.take_pending_summon(), Some(Vec2::new(1.0, 2.0)));
        assert_eq!(session.take_pending_summon(), None);
    }

    #[test]
    fn open_request_respects_role() {
        let mut session = Session::new(None, Role::Player);
        session.request_open(Tab::Library, None);
        assert_eq!(session.take_open_request(), None);
        session.request_open(Tab::Shapes, Some("x".into()));
        assert_eq!(session.take_open_request().map(|r| r.tab), Some(Tab::Shapes));
    }
}
