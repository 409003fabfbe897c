use std::fmt::Write as _;

use anyhow::{Context, Result, bail};
use time::{OffsetDateTime, UtcOffset};
use todo_reminder_app::{ReminderOutcome, ReminderService, TaskService, TaskStore};
use todo_reminder_core::id::TaskId;
use todo_reminder_core::{Task, format_deadline, parse_deadline};
use todo_reminder_mail::MailTransport;

use crate::{Command, LsFormat};

pub fn run<S, M>(
    command: Command,
    tasks: &TaskService<S>,
    reminder: &ReminderService<S, M>,
    offset: UtcOffset,
) -> Result<()>
where
    S: TaskStore,
    M: MailTransport,
{
    match command {
        Command::Ls { format } => {
            let listed = tasks.list_all()?;
            if listed.is_empty() {
                println!("No todos found");
                return Ok(());
            }
            match format {
                LsFormat::Table => print!("{}", render_table(&listed, offset)),
                LsFormat::Json => println!("{}", serde_json::to_string_pretty(&listed)?),
            }
        }
        Command::Add { content, until } => {
            let until = parse_deadline(until.as_deref().unwrap_or_default(), offset)?;
            let task = tasks.create(content, until)?;
            println!("created todo: {}", task.id);
        }
        Command::Done { id, undo } => {
            let task = tasks.update_done(parse_id(&id)?, !undo)?;
            let state = if task.done { "done" } else { "open" };
            println!("todo {} is {state}", task.id);
        }
        Command::Rm { id } => {
            let id = parse_id(&id)?;
            tasks.soft_delete(id)?;
            println!("deleted todo: {id}");
        }
        Command::Show { id } => {
            let task = tasks.get(parse_id(&id)?)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        Command::Notify => {
            let report = reminder.notify(OffsetDateTime::now_utc())?;
            println!("{}", report.outcome.message());
            if let ReminderOutcome::Failed { reason } = report.outcome {
                bail!("reminder delivery failed: {reason}");
            }
        }
        Command::Serve { .. } => unreachable!("serve is handled by main"),
    }
    Ok(())
}

fn parse_id(raw: &str) -> Result<TaskId> {
    raw.parse().with_context(|| format!("Invalid todo id: {raw}"))
}

fn render_table(tasks: &[Task], offset: UtcOffset) -> String {
    let mut out = String::new();
    out.push_str("ID | Done | Until | Content\n");
    out.push_str("-- | ---- | ----- | -------\n");
    for task in tasks {
        let done = if task.done { "x" } else { " " };
        let until = task
            .until
            .map_or_else(|| "-".to_owned(), |until| format_deadline(until, offset));
        let _ = writeln!(out, "{} | [{done}] | {until} | {}", task.id, task.content);
    }
    out
}
