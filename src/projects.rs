use std::time::Duration;

#[cfg(test)]
use mock_instant::Instant;
#[cfg(not(test))]
use std::time::Instant;

use log::debug;

use crate::error::{Error, Result};
use crate::spinner::spinner;

const BAR_CELLS: usize = 10;
const BAR_FILLED: &str = "▓";
const BAR_EMPTY: &str = "░";

/// A named long-running task shown in the live region.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub owner: Option<String>,
    pub last_updated: Instant,
    pub percent: f64,
    pub spinner: &'static str,
}

impl Project {
    pub fn is_stale(&self, now: Instant, stale_after: Duration) -> bool {
        now > self.last_updated && now.duration_since(self.last_updated) > stale_after
    }

    /// One live-region line: spinner (or `STALE - `), owner, name, percent
    /// and a ten cell bar when the percent is in `(-1, 100]`.
    pub fn line(&self, now: Instant, stale_after: Duration) -> String {
        let mut line = if self.is_stale(now, stale_after) {
            String::from("STALE - ")
        } else {
            format!("{} ", self.spinner)
        };
        if let Some(owner) = &self.owner {
            line.push_str(owner);
            line.push_str(": ");
        }
        line.push_str(&self.name);

        let percent = if self.percent.is_finite() {
            (self.percent * 100.0).round() / 100.0
        } else {
            0.0
        };
        line.push_str(&format!(" {percent:.2}% "));
        if percent > -1.0 && percent <= 100.0 {
            line.push_str(&progress_bar(percent));
        }
        line
    }
}

fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 10.0).floor().max(0.0) as usize).min(BAR_CELLS);
    format!(
        "{}{}",
        BAR_FILLED.repeat(filled),
        BAR_EMPTY.repeat(BAR_CELLS - filled)
    )
}

/// Live projects keyed by name, kept in the order they were started so the
/// live region doesn't reshuffle between redraws.
#[derive(Debug, Default)]
pub struct ProjectTable {
    projects: Vec<Project>,
}

impl ProjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter()
    }

    /// Starting a name that is already live replaces it in place.
    pub fn start(&mut self, name: &str, owner: Option<&str>, now: Instant, now_secs: f64) {
        let project = Project {
            name: name.to_owned(),
            owner: owner.map(str::to_owned),
            last_updated: now,
            percent: 0.0,
            spinner: spinner(now_secs),
        };
        match self.projects.iter_mut().find(|p| p.name == name) {
            Some(existing) => {
                debug!("restarting project {name:?}");
                *existing = project;
            }
            None => {
                debug!("starting project {name:?}");
                self.projects.push(project);
            }
        }
    }

    /// Touches the project and, unless `percent` is `None` or zero, sets its
    /// progress. A zero percent never overwrites earlier progress.
    pub fn update(
        &mut self,
        name: &str,
        percent: Option<f64>,
        now: Instant,
        now_secs: f64,
    ) -> Result<()> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::NotFound(name.to_owned()))?;
        project.last_updated = now;
        project.spinner = spinner(now_secs);
        if let Some(percent) = percent.filter(|p| *p != 0.0) {
            project.percent = percent;
        }
        Ok(())
    }

    pub fn close(&mut self, name: &str) -> Result<()> {
        let index = self
            .projects
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| Error::NotFound(name.to_owned()))?;
        self.projects.remove(index);
        debug!("closed project {name:?}");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use mock_instant::{Instant, MockClock};

    use super::ProjectTable;
    use crate::error::Error;

    const STALE: Duration = Duration::from_secs(5);

    #[test]
    fn renders_example_task() {
        let mut table = ProjectTable::new();
        table.start("Task", None, Instant::now(), 0.0);
        table.update("Task", Some(42.5), Instant::now(), 0.0).unwrap();
        let line = table.get("Task").unwrap().line(Instant::now(), STALE);
        insta::assert_snapshot!(line, @"[▓░░] Task 42.50% ▓▓▓▓░░░░░░");
    }

    #[test]
    fn owner_is_prefixed() {
        let mut table = ProjectTable::new();
        table.start("download", Some("net"), Instant::now(), 2.0);
        let line = table.get("download").unwrap().line(Instant::now(), STALE);
        assert_eq!(line, "[░░▓] net: download 0.00% ░░░░░░░░░░");
    }

    #[test]
    fn zero_percent_is_not_an_update() {
        let mut table = ProjectTable::new();
        table.start("Task", None, Instant::now(), 0.0);
        table.update("Task", Some(30.0), Instant::now(), 0.0).unwrap();

        MockClock::advance(Duration::from_secs(1));
        let touched = Instant::now();
        table.update("Task", Some(0.0), touched, 1.0).unwrap();

        let project = table.get("Task").unwrap();
        assert_eq!(project.percent, 30.0);
        assert_eq!(project.last_updated, touched);
        assert_eq!(project.spinner, "[░▓░]");
    }

    #[test]
    fn update_without_percent_only_touches() {
        let mut table = ProjectTable::new();
        table.start("Task", None, Instant::now(), 0.0);
        table.update("Task", Some(12.0), Instant::now(), 0.0).unwrap();
        table.update("Task", None, Instant::now(), 0.0).unwrap();
        assert_eq!(table.get("Task").unwrap().percent, 12.0);
    }

    #[test]
    fn unknown_names_are_not_found() {
        let mut table = ProjectTable::new();
        table.start("a", None, Instant::now(), 0.0);

        assert!(matches!(
            table.update("b", Some(1.0), Instant::now(), 0.0),
            Err(Error::NotFound(name)) if name == "b"
        ));
        assert!(matches!(table.close("b"), Err(Error::NotFound(_))));
        assert_eq!(table.len(), 1);

        table.close("a").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn restart_replaces_in_place() {
        let mut table = ProjectTable::new();
        table.start("a", None, Instant::now(), 0.0);
        table.start("b", None, Instant::now(), 0.0);
        table.update("a", Some(50.0), Instant::now(), 0.0).unwrap();
        table.start("a", Some("again"), Instant::now(), 0.0);

        let names: Vec<_> = table.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        let restarted = table.get("a").unwrap();
        assert_eq!(restarted.percent, 0.0);
        assert_eq!(restarted.owner.as_deref(), Some("again"));
    }

    #[test]
    fn goes_stale_and_recovers() {
        let mut table = ProjectTable::new();
        table.start("sync", None, Instant::now(), 0.0);

        MockClock::advance(Duration::from_secs(5));
        assert!(!table.get("sync").unwrap().is_stale(Instant::now(), STALE));

        MockClock::advance(Duration::from_millis(1));
        let line = table.get("sync").unwrap().line(Instant::now(), STALE);
        assert_eq!(line, "STALE - sync 0.00% ░░░░░░░░░░");

        table.update("sync", None, Instant::now(), 0.0).unwrap();
        let line = table.get("sync").unwrap().line(Instant::now(), STALE);
        assert!(line.starts_with("[▓░░] sync"));
    }

    #[test]
    fn bar_only_within_range() {
        let mut table = ProjectTable::new();
        table.start("p", None, Instant::now(), 0.0);
        let line_for = |table: &mut ProjectTable, percent: f64| {
            table.update("p", Some(percent), Instant::now(), 0.0).unwrap();
            table.get("p").unwrap().line(Instant::now(), STALE)
        };

        assert_eq!(line_for(&mut table, 100.0), "[▓░░] p 100.00% ▓▓▓▓▓▓▓▓▓▓");
        assert_eq!(line_for(&mut table, 100.5), "[▓░░] p 100.50% ");
        assert_eq!(line_for(&mut table, -0.5), "[▓░░] p -0.50% ░░░░░░░░░░");
        assert_eq!(line_for(&mut table, -1.0), "[▓░░] p -1.00% ");
        assert_eq!(line_for(&mut table, 99.999), "[▓░░] p 100.00% ▓▓▓▓▓▓▓▓▓▓");
        assert_eq!(line_for(&mut table, f64::NAN), "[▓░░] p 0.00% ░░░░░░░░░░");
    }
}
