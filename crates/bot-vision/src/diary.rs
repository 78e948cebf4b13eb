use bytes::Bytes;
use tracing::info;

use bot_proto::Diagnosis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Disease,
    Note,
}

#[derive(Debug, Clone)]
pub struct DiaryNote {
    pub kind: NoteKind,
    pub title: String,
    pub description: String,
    pub image: Option<Bytes>,
}

impl DiaryNote {
    pub fn patrol_snap(image: Bytes) -> Self {
        Self {
            kind: NoteKind::Note,
            title: "Auto Patrol Snap".into(),
            description: "Image captured during automated patrol sequence.".into(),
            image: Some(image),
        }
    }

    pub fn diagnosis(d: &Diagnosis, image: Bytes) -> Self {
        Self {
            kind: NoteKind::Disease,
            title: d.disease_name.clone(),
            description: d.advice.clone(),
            image: Some(image),
        }
    }
}

/// Field diary sink. Writes are fire-and-forget.
pub trait Diary: Send + Sync {
    fn add_note(&self, note: DiaryNote);
}

/// Diary that only records notes in the log.
pub struct LogDiary;

impl Diary for LogDiary {
    fn add_note(&self, note: DiaryNote) {
        info!(
            kind = ?note.kind,
            image_bytes = note.image.as_ref().map(|b| b.len()).unwrap_or(0),
            "diary: {}: {}",
            note.title,
            note.description
        );
    }
}
