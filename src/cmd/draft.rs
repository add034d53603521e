use std::fs;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Args;

use crate::context::AppContext;
use crate::domain::conversation::{FormFields, answer_field};
use crate::domain::reply::AssistantReply;
use crate::domain::ticket::{TicketDraft, TicketSection};
use crate::error::AppResult;
use crate::workflow::refine::{TurnOutcome, submit};

#[derive(Args, Debug, Clone, Default)]
pub struct DraftArgs {
    /// The user story, e.g. "As a user, I want password reset".
    #[arg(short, long)]
    pub story: Option<String>,
    /// Free-form context / brain dump.
    #[arg(short, long, conflicts_with = "context_file")]
    pub context: Option<String>,
    /// Read the context from a file instead.
    #[arg(long)]
    pub context_file: Option<PathBuf>,
    /// Write the final draft to this file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Terminal stand-in for the web form: reads field values, shows replies.
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// `None` once input is exhausted.
    fn read_line(&mut self, label: &str) -> AppResult<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Lines until the first blank one.
    fn read_block(&mut self, label: &str) -> AppResult<String> {
        writeln!(self.output, "{label} (finish with an empty line):")?;
        let mut lines = Vec::new();
        while let Some(line) = self.read_line("> ")? {
            if line.is_empty() {
                break;
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }

    /// Closed input takes the default.
    fn confirm(&mut self, question: &str, default_yes: bool) -> AppResult<bool> {
        let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
        let answer = self.read_line(&format!("{question} {hint} "))?;
        Ok(match answer.as_deref().map(str::to_lowercase).as_deref() {
            Some("y") | Some("yes") => true,
            Some("n") | Some("no") => false,
            Some("") | None => default_yes,
            _ => false,
        })
    }

    fn show_reply(&mut self, reply: &AssistantReply) -> AppResult<()> {
        let draft = TicketDraft::from_plain_text(&reply.ticket_draft);
        writeln!(self.output)?;
        writeln!(self.output, "=== Ticket preview ===")?;
        if draft.is_empty() {
            writeln!(self.output, "(the model returned an empty draft)")?;
        }
        for section in TicketSection::ALL {
            let body = draft.section(section);
            if body.is_empty() {
                continue;
            }
            writeln!(self.output, "\n{}\n{body}", section.title())?;
        }

        if !reply.open_questions.is_empty() {
            writeln!(self.output, "\nOpen questions for developers:")?;
            for question in &reply.open_questions {
                writeln!(self.output, "  - {question}")?;
            }
        }
        writeln!(self.output)?;
        Ok(())
    }

    /// Collects answers into `fields`. Returns how many were non-empty, or
    /// `None` if input closed before every question was asked.
    fn ask(&mut self, questions: &[String], fields: &mut FormFields) -> AppResult<Option<usize>> {
        writeln!(self.output, "Clarifying questions (Enter to skip):")?;
        let mut answered = 0;
        for (index, question) in questions.iter().enumerate() {
            writeln!(self.output, "{}. {question}", index + 1)?;
            let Some(answer) = self.read_line("   > ")? else {
                return Ok(None);
            };
            if !answer.is_empty() {
                answered += 1;
            }
            fields.set(answer_field(index), answer);
        }
        Ok(Some(answered))
    }
}

pub async fn run(ctx: &AppContext, args: DraftArgs) -> AppResult<()> {
    let stdin = std::io::stdin();
    let mut terminal = Terminal::new(stdin.lock(), std::io::stdout());
    run_with(ctx, args, &mut terminal).await
}

pub async fn run_with<R: BufRead, W: Write>(
    ctx: &AppContext,
    args: DraftArgs,
    terminal: &mut Terminal<R, W>,
) -> AppResult<()> {
    let user_story = match args.story {
        Some(story) => story,
        None => terminal.read_line("User story: ")?.unwrap_or_default(),
    };
    let context = match (args.context, args.context_file) {
        (Some(context), _) => context,
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => terminal.read_block("Context & brain dump")?,
    };

    let mut fields = FormFields::initial(&user_story, &context);
    let final_draft = loop {
        match submit(ctx, &fields).await {
            TurnOutcome::Failed(err) => {
                writeln!(terminal.output, "Error: {err}")?;
                if !terminal.confirm("Resubmit?", false)? {
                    return Ok(());
                }
            }
            TurnOutcome::Converged(reply) => {
                terminal.show_reply(&reply)?;
                writeln!(terminal.output, "No further questions; the draft is complete.")?;
                break reply.ticket_draft;
            }
            TurnOutcome::AwaitingAnswers(reply) => {
                terminal.show_reply(&reply)?;
                let mut next =
                    FormFields::for_next_turn(&user_story, &context, &reply.clarifying_questions);
                let Some(answered) = terminal.ask(&reply.clarifying_questions, &mut next)? else {
                    writeln!(terminal.output, "\nInput closed; keeping the current draft.")?;
                    break reply.ticket_draft;
                };
                if answered == 0
                    && terminal.confirm("No answers given. Finish with this draft?", true)?
                {
                    break reply.ticket_draft;
                }
                fields = next;
            }
        }
    };

    if let Some(path) = args.output {
        fs::write(&path, &final_draft)?;
        writeln!(terminal.output, "Draft written to {}", path.display())?;
    }
    Ok(())
}
