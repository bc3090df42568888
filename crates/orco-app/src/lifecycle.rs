// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleCode {
    Announced,
    Running,
    Finished,
    Errored,
    Archived,
    Detached,
    Freed,
    FreedArchived,
    Unknown,
}

impl LifecycleCode {
    /// Codes a view can filter on, in the order the filter cycles through them.
    pub const FILTERABLE: [Self; 8] = [
        Self::Finished,
        Self::Errored,
        Self::Running,
        Self::Announced,
        Self::Archived,
        Self::Freed,
        Self::FreedArchived,
        Self::Detached,
    ];

    pub const fn as_code(self) -> &'static str {
        match self {
            Self::Announced => "a",
            Self::Running => "r",
            Self::Finished => "f",
            Self::Errored => "e",
            Self::Archived => "F",
            Self::Detached => "",
            Self::Freed => "d",
            Self::FreedArchived => "D",
            Self::Unknown => "?",
        }
    }

    /// Total over every input; unmapped codes become `Unknown`.
    pub fn parse(code: &str) -> Self {
        match code {
            "a" => Self::Announced,
            "r" => Self::Running,
            "f" => Self::Finished,
            "e" => Self::Errored,
            "F" => Self::Archived,
            "" => Self::Detached,
            "d" => Self::Freed,
            "D" => Self::FreedArchived,
            _ => Self::Unknown,
        }
    }

    pub const fn descriptor(self) -> StateDescriptor {
        match self {
            Self::Announced => {
                StateDescriptor::new("announced", ColorHint::Orange, IconKind::Hourglass)
            }
            Self::Running => {
                StateDescriptor::new("running", ColorHint::Orange, IconKind::Hourglass)
            }
            Self::Finished => StateDescriptor::new("finished", ColorHint::Green, IconKind::Check),
            Self::Errored => StateDescriptor::new("errored", ColorHint::Red, IconKind::Cross),
            Self::Archived => StateDescriptor::new("archived", ColorHint::Blue, IconKind::Archive),
            Self::Detached => {
                StateDescriptor::new("detached", ColorHint::Gray, IconKind::Placeholder)
            }
            Self::Freed => StateDescriptor::new("freed", ColorHint::Brown, IconKind::Trash),
            Self::FreedArchived => {
                StateDescriptor::new("freed-archived", ColorHint::Gray, IconKind::Trash)
            }
            Self::Unknown => StateDescriptor::FALLBACK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorHint {
    Green,
    Orange,
    Red,
    Blue,
    Brown,
    Gray,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    Check,
    Hourglass,
    Cross,
    Archive,
    Trash,
    Placeholder,
    Unknown,
}

impl IconKind {
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Check => "✓",
            Self::Hourglass => "⧗",
            Self::Cross => "✗",
            Self::Archive => "▣",
            Self::Trash => "⌫",
            Self::Placeholder => "·",
            Self::Unknown => "?",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateDescriptor {
    pub label: &'static str,
    pub color: ColorHint,
    pub icon: IconKind,
}

impl StateDescriptor {
    pub const FALLBACK: Self = Self::new("?", ColorHint::Default, IconKind::Unknown);

    const fn new(label: &'static str, color: ColorHint, icon: IconKind) -> Self {
        Self { label, color, icon }
    }
}

pub fn describe(code: &str) -> StateDescriptor {
    LifecycleCode::parse(code).descriptor()
}
