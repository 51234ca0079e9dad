//! Task ranking.
//!
//! Orders the backlog for greedy placement by
//! `score = weight(priority) / estimated_minutes`, so important and short
//! tasks go first and more distinct tasks get served before time runs out.
//!
//! Ties on score fall back to the earlier due date (tasks without one come
//! last), then to submission order. The order depends only on the inputs.

use std::cmp::Ordering;

use crate::schedule::Task;

use super::config::SchedulerConfig;

/// A task together with its position in the backlog and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTask<'a> {
    pub task: &'a Task,
    /// Index in the submitted backlog.
    pub index: usize,
    pub score: f64,
}

/// Ranks tasks according to a scheduler configuration.
pub struct TaskRanker<'c> {
    config: &'c SchedulerConfig,
}

impl<'c> TaskRanker<'c> {
    pub fn new(config: &'c SchedulerConfig) -> Self {
        Self { config }
    }

    /// Score of a single task. Tasks are validated before ranking, so the
    /// duration is positive here.
    pub fn score(&self, task: &Task) -> f64 {
        self.config.weight_for(task.priority) / task.estimated_minutes as f64
    }

    /// Produce the placement order for a backlog.
    pub fn rank<'a>(&self, tasks: &'a [Task]) -> Vec<RankedTask<'a>> {
        let mut ranked: Vec<RankedTask<'a>> = tasks
            .iter()
            .enumerate()
            .map(|(index, task)| RankedTask {
                task,
                index,
                score: self.score(task),
            })
            .collect();

        ranked.sort_by(compare_ranked);
        ranked
    }
}

fn compare_ranked(a: &RankedTask<'_>, b: &RankedTask<'_>) -> Ordering {
    // Descending score
    b.score
        .total_cmp(&a.score)
        .then_with(|| match (a.task.due_date, b.task.due_date) {
            (Some(da), Some(db)) => da.cmp(&db),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.index.cmp(&b.index))
}

/// Convenience function to rank a backlog with the given configuration
pub fn rank_tasks<'a>(tasks: &'a [Task], config: &SchedulerConfig) -> Vec<RankedTask<'a>> {
    TaskRanker::new(config).rank(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn names(ranked: &[RankedTask<'_>]) -> Vec<String> {
        ranked.iter().map(|r| r.task.name.clone()).collect()
    }

    #[test]
    fn higher_priority_first_at_equal_duration() {
        let tasks = vec![Task::new("low", 1, 30), Task::new("high", 5, 30)];
        let ranked = rank_tasks(&tasks, &SchedulerConfig::default());
        assert_eq!(names(&ranked), ["high", "low"]);
    }

    #[test]
    fn shorter_task_wins_at_equal_priority() {
        let tasks = vec![Task::new("long", 2, 120), Task::new("short", 2, 15)];
        let ranked = rank_tasks(&tasks, &SchedulerConfig::default());
        assert_eq!(names(&ranked), ["short", "long"]);
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn score_trades_priority_against_duration() {
        // 3/30 = 0.1 beats 4/60 = 0.066..
        let tasks = vec![Task::new("p4-60", 4, 60), Task::new("p3-30", 3, 30)];
        let ranked = rank_tasks(&tasks, &SchedulerConfig::default());
        assert_eq!(names(&ranked), ["p3-30", "p4-60"]);
    }

    #[test]
    fn ties_break_on_due_date_then_submission() {
        let early = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();
        let tasks = vec![
            Task::new("none-a", 2, 30),
            Task::new("late", 2, 30).with_due_date(late),
            Task::new("none-b", 2, 30),
            Task::new("early", 2, 30).with_due_date(early),
        ];
        let ranked = rank_tasks(&tasks, &SchedulerConfig::default());
        assert_eq!(names(&ranked), ["early", "late", "none-a", "none-b"]);
    }

    #[test]
    fn configured_weights_change_order() {
        // Identity: 2/20 = 0.1 beats 3/60 = 0.05.
        // With level 3 weighted at 30: 30/60 = 0.5 beats 2/20 = 0.1.
        let tasks = vec![Task::new("quick", 2, 20), Task::new("heavy", 3, 60)];
        let config = SchedulerConfig::default().with_priority_weights([(2, 2.0), (3, 30.0)]);
        assert_eq!(names(&rank_tasks(&tasks, &SchedulerConfig::default())), ["quick", "heavy"]);
        assert_eq!(names(&rank_tasks(&tasks, &config)), ["heavy", "quick"]);
    }

    #[test]
    fn ranking_is_idempotent() {
        let tasks: Vec<Task> = (0..20)
            .map(|i| Task::new(format!("t{i}"), i % 4, 15 + (i as i64 % 3) * 15))
            .collect();
        let config = SchedulerConfig::default();
        let first = names(&rank_tasks(&tasks, &config));
        let second = names(&rank_tasks(&tasks, &config));
        assert_eq!(first, second);

        // Re-ranking an already ranked backlog keeps the order.
        let reordered: Vec<Task> = rank_tasks(&tasks, &config)
            .into_iter()
            .map(|r| r.task.clone())
            .collect();
        assert_eq!(names(&rank_tasks(&reordered, &config)), first);
    }
}
