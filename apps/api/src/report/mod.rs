//! Report Renderer: single verdicts and batch summaries as DOCX documents.
//!
//! Pure transformation into an in-memory byte buffer. Batch tables always
//! populate every cell; absent values render as `N/A`. Client-posted report
//! bodies arrive as a [`ReportPayload`] and are normalized before rendering.

use std::io::Cursor;

use docx_rs::{
    AbstractNumbering, Docx, IndentLevel, Level, LevelJc, LevelText, NumberFormat, Numbering,
    NumberingId, Paragraph, Run, Start, Style, StyleType, Table, TableCell, TableRow,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::analysis::batch::{BatchResult, ItemOutcome};
use crate::analysis::verdict::{clamp_score, verdict_from_value, ErrorVerdict, Status, Verdict};

pub mod handlers;

pub const REPORT_FILENAME: &str = "Analysis_Report.docx";

const MISSING: &str = "N/A";
const BATCH_COLUMNS: [&str; 6] = ["Name", "Email", "Experience", "Score(%)", "Status", "Phone"];

const TITLE_STYLE: &str = "Title";
const HEADING_STYLE: &str = "Heading1";
const BULLET_STYLE: &str = "ListBullet";
const BULLET_NUMBERING: usize = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Report {
    Single { verdict: Verdict },
    Batch { candidates: Vec<CandidateSummary> },
}

/// Report body as posted to `/download-docx`.
#[derive(Debug, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReportPayload {
    Single { verdict: Value },
    Batch { candidates: Vec<CandidateSummary> },
}

impl ReportPayload {
    /// Runs the verdict through the same normalization as service output and
    /// re-derives every scored row's status from its clamped score.
    pub fn normalize(self, accept_threshold: u8) -> Result<Report, ErrorVerdict> {
        match self {
            ReportPayload::Single { verdict } => Ok(Report::Single {
                verdict: verdict_from_value(verdict, accept_threshold)?,
            }),
            ReportPayload::Batch { candidates } => Ok(Report::Batch {
                candidates: candidates
                    .into_iter()
                    .map(|c| c.with_derived_status(accept_threshold))
                    .collect(),
            }),
        }
    }
}

/// One row of the batch table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSummary {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default, deserialize_with = "clamped_score")]
    pub score: Option<u8>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CandidateSummary {
    /// Rows without a score (failed items) keep their status text.
    fn with_derived_status(self, accept_threshold: u8) -> Self {
        match self.score {
            Some(score) => Self {
                status: Some(Status::from_score(score, accept_threshold).as_str().to_string()),
                ..self
            },
            None => self,
        }
    }
}

fn clamped_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.and_then(clamp_score))
}

impl From<&Verdict> for CandidateSummary {
    fn from(verdict: &Verdict) -> Self {
        Self {
            name: verdict.candidate_name.clone(),
            email: verdict.email.clone(),
            experience: verdict.experience.clone(),
            score: Some(verdict.match_score),
            status: Some(verdict.status.as_str().to_string()),
            phone: verdict.phone.clone(),
        }
    }
}

impl Report {
    /// One row per batch position. Failed items are listed under their file
    /// name with status `Failed`.
    pub fn from_batch(result: &BatchResult) -> Self {
        let candidates = result
            .items
            .iter()
            .map(|item| match &item.outcome {
                ItemOutcome::Analyzed(verdict) => CandidateSummary::from(verdict),
                ItemOutcome::Failed(_) => CandidateSummary {
                    name: Some(item.filename.clone()),
                    status: Some("Failed".to_string()),
                    ..CandidateSummary::default()
                },
            })
            .collect();

        Report::Batch { candidates }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("DOCX packaging failed: {0}")]
    Pack(String),
}

pub fn render(report: &Report) -> Result<Vec<u8>, RenderError> {
    let docx = match report {
        Report::Single { verdict } => render_single(verdict),
        Report::Batch { candidates } => render_batch(candidates),
    };

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| RenderError::Pack(e.to_string()))?;
    Ok(buf.into_inner())
}

/// Empty document carrying the title, heading and bullet-list definitions.
fn report_document() -> Docx {
    let bullet_level = Level::new(
        0,
        Start::new(1),
        NumberFormat::new("bullet"),
        LevelText::new("\u{2022}"),
        LevelJc::new("left"),
    );

    Docx::new()
        .add_style(
            Style::new(TITLE_STYLE, StyleType::Paragraph)
                .name("Title")
                .size(52),
        )
        .add_style(
            Style::new(HEADING_STYLE, StyleType::Paragraph)
                .name("Heading 1")
                .size(28)
                .bold(),
        )
        .add_style(Style::new(BULLET_STYLE, StyleType::Paragraph).name("List Bullet"))
        .add_abstract_numbering(AbstractNumbering::new(BULLET_NUMBERING).add_level(bullet_level))
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING))
}

fn render_single(verdict: &Verdict) -> Docx {
    let mut docx = report_document()
        .add_paragraph(title("AI Resume Analysis Report"))
        .add_paragraph(heading("Candidate Match Details"))
        .add_paragraph(plain(&format!("Match Score: {}%", verdict.match_score)));

    docx = bullet_section(docx, "Matched Skills", &verdict.matched_skills);
    docx = bullet_section(docx, "Missing Skills", &verdict.missing_skills);
    if !verdict.suggestions.is_empty() {
        docx = bullet_section(docx, "AI Suggestions", &verdict.suggestions);
    }
    docx
}

fn render_batch(candidates: &[CandidateSummary]) -> Docx {
    let header = TableRow::new(
        BATCH_COLUMNS
            .iter()
            .map(|title| TableCell::new().add_paragraph(bold(title)))
            .collect(),
    );

    let rows = candidates.iter().map(|c| {
        let score = c.score.map(|s| format!("{s}%"));
        let cells = [
            c.name.as_deref(),
            c.email.as_deref(),
            c.experience.as_deref(),
            score.as_deref(),
            c.status.as_deref(),
            c.phone.as_deref(),
        ];
        TableRow::new(
            cells
                .into_iter()
                .map(|value| TableCell::new().add_paragraph(plain(cell_text(value))))
                .collect(),
        )
    });

    let table = Table::new(std::iter::once(header).chain(rows).collect());

    report_document()
        .add_paragraph(title("HR Batch Analysis Report"))
        .add_table(table)
}

fn cell_text(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => MISSING,
    }
}

fn bullet_section(docx: Docx, heading_text: &str, items: &[String]) -> Docx {
    let docx = docx.add_paragraph(heading(heading_text));
    if items.is_empty() {
        return docx.add_paragraph(plain("None identified"));
    }
    items.iter().fold(docx, |docx, item| docx.add_paragraph(bullet(item)))
}

fn plain(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

fn bold(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text).bold())
}

fn title(text: &str) -> Paragraph {
    plain(text).style(TITLE_STYLE)
}

fn heading(text: &str) -> Paragraph {
    plain(text).style(HEADING_STYLE)
}

fn bullet(text: &str) -> Paragraph {
    plain(text)
        .style(BULLET_STYLE)
        .numbering(NumberingId::new(BULLET_NUMBERING), IndentLevel::new(0))
}
