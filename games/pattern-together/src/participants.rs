use serde::Serialize;

use crate::pattern::PatternError;

/// Stable identity of someone (or something) touching cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ParticipantId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantKind {
    Human,
    Automated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub kind: ParticipantKind,
    pub name: String,
}

impl Participant {
    fn human(id: u8) -> Self {
        Self {
            id: ParticipantId(id),
            kind: ParticipantKind::Human,
            name: format!("Player {}", id + 1),
        }
    }

    fn helper(id: u8) -> Self {
        Self {
            id: ParticipantId(id),
            kind: ParticipantKind::Automated,
            name: "Helper".to_string(),
        }
    }
}

/// Who plays a round and how many distinct touches flip a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// One player, every touch flips.
    Solo,
    /// One player and the automated helper, both must touch.
    WithHelper,
    /// Two players, both must touch.
    Pair,
    /// Three players, any two touching flips.
    Trio,
}

impl PlayMode {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(PlayMode::Solo),
            1 => Some(PlayMode::WithHelper),
            2 => Some(PlayMode::Pair),
            3 => Some(PlayMode::Trio),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            PlayMode::Solo => 0,
            PlayMode::WithHelper => 1,
            PlayMode::Pair => 2,
            PlayMode::Trio => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PlayMode::Solo => "solo",
            PlayMode::WithHelper => "with_helper",
            PlayMode::Pair => "pair",
            PlayMode::Trio => "trio",
        }
    }

    pub fn quorum(self) -> usize {
        match self {
            PlayMode::Solo => 1,
            PlayMode::WithHelper | PlayMode::Pair | PlayMode::Trio => 2,
        }
    }

    pub fn humans(self) -> u8 {
        match self {
            PlayMode::Solo | PlayMode::WithHelper => 1,
            PlayMode::Pair => 2,
            PlayMode::Trio => 3,
        }
    }

    pub fn has_helper(self) -> bool {
        self == PlayMode::WithHelper
    }
}

/// Participants of the current round plus whose turn it is.
#[derive(Debug, Clone)]
pub struct Roster {
    participants: Vec<Participant>,
    humans: Vec<ParticipantId>,
    turn: usize,
}

impl Roster {
    pub fn for_mode(mode: PlayMode) -> Self {
        let mut participants: Vec<Participant> = (0..mode.humans()).map(Participant::human).collect();
        if mode.has_helper() {
            participants.push(Participant::helper(mode.humans()));
        }
        let humans = participants
            .iter()
            .filter(|p| p.kind == ParticipantKind::Human)
            .map(|p| p.id)
            .collect();
        Self { participants, humans, turn: 0 }
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn helper(&self) -> Option<ParticipantId> {
        self.participants
            .iter()
            .find(|p| p.kind == ParticipantKind::Automated)
            .map(|p| p.id)
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.participants.iter().any(|p| p.id == id)
    }

    /// Human whose turn it is.
    pub fn active_human(&self) -> ParticipantId {
        self.humans[self.turn]
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    /// The n-th human of this round.
    pub fn human(&self, index: usize) -> Result<ParticipantId, PatternError> {
        self.humans
            .get(index)
            .copied()
            .ok_or(PatternError::UnknownParticipant(ParticipantId(index.min(u8::MAX as usize) as u8)))
    }

    pub fn set_turn(&mut self, index: usize) -> Result<(), PatternError> {
        self.human(index)?;
        self.turn = index;
        Ok(())
    }

    /// Pass the turn to the next human (no-op with a single human).
    pub fn advance_turn(&mut self) {
        self.turn = (self.turn + 1) % self.humans.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_mode_has_one_human_and_one_automated() {
        let roster = Roster::for_mode(PlayMode::WithHelper);
        assert_eq!(roster.participants().len(), 2);
        assert_eq!(roster.helper(), Some(ParticipantId(1)));
        assert_eq!(roster.active_human(), ParticipantId(0));
    }

    #[test]
    fn trio_turns_rotate() {
        let mut roster = Roster::for_mode(PlayMode::Trio);
        assert!(roster.helper().is_none());
        let order: Vec<_> = (0..4)
            .map(|_| {
                let id = roster.active_human();
                roster.advance_turn();
                id
            })
            .collect();
        assert_eq!(order, vec![ParticipantId(0), ParticipantId(1), ParticipantId(2), ParticipantId(0)]);
    }

    #[test]
    fn unknown_human_is_an_error() {
        let mut roster = Roster::for_mode(PlayMode::Pair);
        assert!(roster.set_turn(1).is_ok());
        assert_eq!(roster.set_turn(2), Err(PatternError::UnknownParticipant(ParticipantId(2))));
        assert_eq!(roster.turn(), 1);
    }

    #[test]
    fn quorum_per_mode() {
        assert_eq!(PlayMode::Solo.quorum(), 1);
        assert_eq!(PlayMode::Pair.quorum(), 2);
        assert_eq!(PlayMode::Trio.quorum(), 2);
        assert_eq!(PlayMode::from_code(9), None);
    }
}
