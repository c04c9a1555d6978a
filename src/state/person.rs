/// A prize recorded against a person, in award order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrizeAward {
    /// Identifier of the awarded prize, when the remote supplied one.
    pub prize_id: Option<i64>,
    /// Display name of the prize at award time.
    pub prize_name: String,
    /// Award timestamp as sent by the remote (empty when unknown).
    pub prize_time: String,
}

/// Canonical participant entry built from a roster fetch.
///
/// `is_winner` and `prizes` are both taken from the remote as-is; neither is
/// derived from the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    /// Remote primary key.
    pub id: Option<i64>,
    /// `lottery_code`, else the remote `uid`, else a client generated id.
    pub code: String,
    /// Whether `code` was generated locally because the remote had none.
    pub code_assigned: bool,
    /// Remote uuid, empty when absent.
    pub uuid: String,
    /// Display name.
    pub name: String,
    /// Department.
    pub department: String,
    /// Company.
    pub company: String,
    /// Job title.
    pub position: String,
    /// Identity document or badge number.
    pub identity: String,
    /// Avatar URL.
    pub avatar: String,
    /// Phone number as text.
    pub phone: String,
    /// Checked in at the event.
    pub signed_in: bool,
    /// Winner flag as reported by the remote.
    pub is_winner: bool,
    /// Awards in the order the remote listed them.
    pub prizes: Vec<PrizeAward>,
    /// Creation timestamp; generated locally when missing.
    pub created_at: String,
    /// Last update timestamp; generated locally when missing.
    pub updated_at: String,
}

/// Cached participant collection for the current scope.
#[derive(Debug, Clone, Default)]
pub struct PersonRoster {
    people: Vec<PersonRecord>,
}

impl PersonRoster {
    /// Empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached person.
    pub fn reset(&mut self) {
        self.people.clear();
    }

    /// Swap in a freshly adapted collection, discarding the previous one entirely.
    pub fn replace_all(&mut self, people: Vec<PersonRecord>) {
        self.people = people;
    }

    /// Every cached person, in remote order.
    pub fn all(&self) -> &[PersonRecord] {
        &self.people
    }

    /// Number of cached people.
    pub fn len(&self) -> usize {
        self.people.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Person by lottery code.
    pub fn find(&self, code: &str) -> Option<&PersonRecord> {
        self.people.iter().find(|person| person.code == code)
    }

    /// People flagged as winners by the remote.
    pub fn winners(&self) -> impl Iterator<Item = &PersonRecord> {
        self.people.iter().filter(|person| person.is_winner)
    }

    /// People who checked in.
    pub fn signed_in(&self) -> impl Iterator<Item = &PersonRecord> {
        self.people.iter().filter(|person| person.signed_in)
    }

    /// Codes the remote knows these people by; locally generated codes are skipped.
    pub fn remote_codes(&self) -> Vec<String> {
        self.people
            .iter()
            .filter(|person| !person.code_assigned && !person.code.is_empty())
            .map(|person| person.code.clone())
            .collect()
    }
}
