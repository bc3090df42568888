// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabKind {
    Builders,
    Collections,
    Executors,
    Reports,
}

impl TabKind {
    pub const ALL: [Self; 4] = [
        Self::Builders,
        Self::Collections,
        Self::Executors,
        Self::Reports,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Builders => "builders",
            Self::Collections => "collections",
            Self::Executors => "executors",
            Self::Reports => "reports",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "builders" => Some(Self::Builders),
            "collections" => Some(Self::Collections),
            "executors" => Some(Self::Executors),
            "reports" => Some(Self::Reports),
            _ => None,
        }
    }

    pub const fn resource(self) -> Resource {
        match self {
            Self::Builders => Resource::Builders,
            Self::Collections => Resource::Collections,
            Self::Executors => Resource::Executors,
            Self::Reports => Resource::Reports,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub active_tab: TabKind,
    pub drill_stack: Vec<Resource>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            active_tab: TabKind::Builders,
            drill_stack: Vec::new(),
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextTab,
    PrevTab,
    Drill(Resource),
    CloseDrill,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    TabChanged(TabKind),
    ViewChanged(Resource),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    /// The resource of the view currently on screen.
    pub fn active_resource(&self) -> Resource {
        self.drill_stack
            .last()
            .cloned()
            .unwrap_or_else(|| self.active_tab.resource())
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextTab => self.rotate_tab(1),
            AppCommand::PrevTab => self.rotate_tab(-1),
            AppCommand::Drill(resource) => {
                let title = resource.title();
                self.drill_stack.push(resource.clone());
                vec![
                    AppEvent::ViewChanged(resource),
                    self.set_status(&format!("opened {title}")),
                ]
            }
            AppCommand::CloseDrill => {
                if self.drill_stack.pop().is_none() {
                    return Vec::new();
                }
                vec![AppEvent::ViewChanged(self.active_resource())]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_tab(&mut self, delta: isize) -> Vec<AppEvent> {
        let tabs = TabKind::ALL;
        let current = tabs
            .iter()
            .position(|tab| *tab == self.active_tab)
            .unwrap_or(0) as isize;
        let len = tabs.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_tab = tabs[next];
        self.drill_stack.clear();
        vec![
            AppEvent::TabChanged(self.active_tab),
            AppEvent::ViewChanged(self.active_resource()),
        ]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
