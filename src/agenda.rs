//! Date-driven views over a user's blocks: calendar cells, dashboard
//! sections and task urgency.
//!
//! Everything here is pure. Callers pass the block list (already joined with
//! course info) and an [`AgendaClock`] describing "now" and the viewer's
//! timezone.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{BlockBody, Course, CourseBlock, CourseRef, Moment, TaskContent, TaskStatus};

pub const DUE_SOON_DAYS: i64 = 3;
pub const UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgendaClock {
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
}

impl AgendaClock {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.with_timezone(&self.offset).date_naive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Urgency {
    Overdue,
    DueSoon,
}

/// The date a block is scheduled on: an event's `date`, a task's `dueDate`.
pub fn scheduled_moment(block: &CourseBlock) -> Option<&Moment> {
    match &block.block.body {
        BlockBody::Event(event) => Some(&event.date),
        BlockBody::Task(task) => task.due_date.as_ref(),
        BlockBody::Note(_) | BlockBody::File(_) => None,
    }
}

pub fn filter_course<'a>(blocks: &'a [CourseBlock], course_id: Option<&str>) -> Vec<&'a CourseBlock> {
    blocks
        .iter()
        .filter(|b| course_id.is_none_or(|id| b.course.id == id))
        .collect()
}

pub fn classify_task(task: &TaskContent, clock: &AgendaClock) -> Option<Urgency> {
    if task.status == TaskStatus::Complete {
        return None;
    }
    let due = task.due_date?.resolve(clock.offset);
    if due < clock.now {
        Some(Urgency::Overdue)
    } else if due <= clock.now + Duration::days(DUE_SOON_DAYS) {
        Some(Urgency::DueSoon)
    } else {
        None
    }
}

/// Whole days until `due`, rounded up; negative once overdue.
pub fn days_left(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (due - now).num_milliseconds();
    let day = Duration::days(1).num_milliseconds();
    ms.div_euclid(day) + i64::from(ms.rem_euclid(day) != 0)
}

pub fn is_today(block: &CourseBlock, clock: &AgendaClock) -> bool {
    scheduled_moment(block).is_some_and(|m| m.local_day(clock.offset) == clock.today())
}

pub fn is_upcoming(block: &CourseBlock, clock: &AgendaClock) -> bool {
    scheduled_moment(block).is_some_and(|m| m.resolve(clock.offset) > clock.now)
}

#[derive(Debug, Clone, Default)]
pub struct DayBucket<'a> {
    pub events: Vec<&'a CourseBlock>,
    pub tasks: Vec<&'a CourseBlock>,
}

/// Groups events and dated tasks by local calendar day. Notes, files and
/// tasks without a due date are left out.
pub fn bucket_by_day<'a, I>(blocks: I, offset: FixedOffset) -> BTreeMap<NaiveDate, DayBucket<'a>>
where
    I: IntoIterator<Item = &'a CourseBlock>,
{
    let mut days: BTreeMap<NaiveDate, DayBucket<'a>> = BTreeMap::new();
    for block in blocks {
        let Some(moment) = scheduled_moment(block) else {
            continue;
        };
        let bucket = days.entry(moment.local_day(offset)).or_default();
        match block.block.body {
            BlockBody::Event(_) => bucket.events.push(block),
            BlockBody::Task(_) => bucket.tasks.push(block),
            BlockBody::Note(_) | BlockBody::File(_) => {}
        }
    }

    let by_time = |b: &&CourseBlock| scheduled_moment(b).map(|m| m.resolve(offset));
    for bucket in days.values_mut() {
        bucket.events.sort_by_key(by_time);
        bucket.tasks.sort_by_key(by_time);
    }
    days
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    #[serde(flatten)]
    pub block: CourseBlock,
    pub urgency: Urgency,
    pub days_left: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub today: NaiveDate,
    pub today_events: Vec<CourseBlock>,
    pub today_tasks: Vec<CourseBlock>,
    pub upcoming_tasks: Vec<CourseBlock>,
    pub overdue_tasks: Vec<Reminder>,
    pub due_soon_tasks: Vec<Reminder>,
    pub courses: Vec<CourseRef>,
}

pub fn build_dashboard(blocks: &[&CourseBlock], courses: &[Course], clock: &AgendaClock) -> Dashboard {
    let events = blocks
        .iter()
        .copied()
        .filter(|b| matches!(b.block.body, BlockBody::Event(_)));
    let tasks: Vec<(&CourseBlock, &TaskContent)> = blocks
        .iter()
        .filter_map(|b| match &b.block.body {
            BlockBody::Task(task) => Some((*b, task)),
            _ => None,
        })
        .collect();

    let today_events = events.filter(|b| is_today(b, clock)).cloned().collect();
    let today_tasks = tasks
        .iter()
        .filter(|(b, _)| is_today(b, clock))
        .map(|(b, _)| (*b).clone())
        .collect();

    let mut upcoming: Vec<(DateTime<Utc>, &CourseBlock)> = tasks
        .iter()
        .filter(|(b, _)| is_upcoming(b, clock))
        .filter_map(|(b, t)| t.due_date.map(|d| (d.resolve(clock.offset), *b)))
        .collect();
    upcoming.sort_by_key(|(due, _)| *due);
    let upcoming_tasks = upcoming
        .into_iter()
        .take(UPCOMING_LIMIT)
        .map(|(_, b)| b.clone())
        .collect();

    let mut overdue_tasks = Vec::new();
    let mut due_soon_tasks = Vec::new();
    for (block, task) in &tasks {
        let (Some(urgency), Some(due)) = (classify_task(task, clock), task.due_date) else {
            continue;
        };
        let reminder = Reminder {
            block: (*block).clone(),
            urgency,
            days_left: days_left(due.resolve(clock.offset), clock.now),
        };
        match urgency {
            Urgency::Overdue => overdue_tasks.push(reminder),
            Urgency::DueSoon => due_soon_tasks.push(reminder),
        }
    }
    overdue_tasks.sort_by_key(|r| r.days_left);
    due_soon_tasks.sort_by_key(|r| r.days_left);

    Dashboard {
        today: clock.today(),
        today_events,
        today_tasks,
        upcoming_tasks,
        overdue_tasks,
        due_soon_tasks,
        courses: courses
            .iter()
            .map(|c| CourseRef {
                id: c.id.clone(),
                name: c.name.clone(),
                code: c.code.clone(),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarRange {
    Month { year: i32, month: u32 },
    /// The Sunday-to-Saturday week containing the given day.
    Week { containing: NaiveDate },
}

impl CalendarRange {
    /// Every day in the range, or `None` for an impossible month or a week
    /// running past the representable dates.
    pub fn days(&self) -> Option<Vec<NaiveDate>> {
        match *self {
            CalendarRange::Month { year, month } => {
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                Some(
                    first
                        .iter_days()
                        .take_while(|d| d.month() == month)
                        .collect(),
                )
            }
            CalendarRange::Week { containing } => {
                let back = i64::from(containing.weekday().num_days_from_sunday());
                let start = containing.checked_sub_signed(Duration::days(back))?;
                let days: Vec<NaiveDate> = start.iter_days().take(7).collect();
                (days.len() == 7).then_some(days)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub events: Vec<CourseBlock>,
    pub tasks: Vec<CourseBlock>,
}

/// One cell per day of `range`, empty days included.
pub fn build_calendar(blocks: &[&CourseBlock], range: CalendarRange, offset: FixedOffset) -> Option<Vec<CalendarDay>> {
    let days = range.days()?;
    let mut buckets = bucket_by_day(blocks.iter().copied(), offset);

    Some(
        days.into_iter()
            .map(|date| {
                let bucket = buckets.remove(&date).unwrap_or_default();
                CalendarDay {
                    date,
                    events: bucket.events.into_iter().cloned().collect(),
                    tasks: bucket.tasks.into_iter().cloned().collect(),
                }
            })
            .collect(),
    )
}
