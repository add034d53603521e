#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketSection {
    UserStory,
    Context,
    AcceptanceCriteria,
}

impl TicketSection {
    pub const ALL: [TicketSection; 3] = [
        TicketSection::UserStory,
        TicketSection::Context,
        TicketSection::AcceptanceCriteria,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            TicketSection::UserStory => "User Story",
            TicketSection::Context => "Context",
            TicketSection::AcceptanceCriteria => "Acceptance Criteria",
        }
    }

    /// Matches a line that consists only of a section title, optionally
    /// followed by a colon.
    pub fn from_heading(line: &str) -> Option<Self> {
        let heading = line.trim().trim_end_matches(':').trim();
        TicketSection::ALL
            .into_iter()
            .find(|section| section.title().eq_ignore_ascii_case(heading))
    }
}

/// The three sections of a draft. The model sends them joined as one plain
/// text block; splitting is only for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketDraft {
    pub user_story_section: String,
    pub context_section: String,
    pub acceptance_criteria_section: String,
}

impl TicketDraft {
    /// Text before the first recognised heading is kept in the user story
    /// section.
    pub fn from_plain_text(text: &str) -> Self {
        let mut draft = TicketDraft::default();
        let mut current = TicketSection::UserStory;
        let mut lines: Vec<&str> = Vec::new();
        let normalized = text.replace('\r', "");

        for line in normalized.lines() {
            match TicketSection::from_heading(line) {
                Some(section) => {
                    draft.append(current, &lines);
                    lines.clear();
                    current = section;
                }
                None => lines.push(line),
            }
        }
        draft.append(current, &lines);
        draft
    }

    pub fn section(&self, section: TicketSection) -> &str {
        match section {
            TicketSection::UserStory => &self.user_story_section,
            TicketSection::Context => &self.context_section,
            TicketSection::AcceptanceCriteria => &self.acceptance_criteria_section,
        }
    }

    pub fn is_empty(&self) -> bool {
        TicketSection::ALL
            .into_iter()
            .all(|section| self.section(section).is_empty())
    }

    fn append(&mut self, section: TicketSection, lines: &[&str]) {
        let body = lines.join("\n");
        let body = body.trim();
        if body.is_empty() {
            return;
        }
        let target = match section {
            TicketSection::UserStory => &mut self.user_story_section,
            TicketSection::Context => &mut self.context_section,
            TicketSection::AcceptanceCriteria => &mut self.acceptance_criteria_section,
        };
        if !target.is_empty() {
            target.push_str("\n\n");
        }
        target.push_str(body);
    }
}
