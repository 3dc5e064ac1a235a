//! Calendar rules for the report date-range picker.
//!
//! Every comparison happens on calendar days in [`APP_TIMEZONE`], whatever the
//! zone of the caller, so the same instant is judged the same way everywhere.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Zone used for every day boundary.
pub const APP_TIMEZONE: Tz = chrono_tz::Asia::Dhaka;

/// Longest range the report form accepts, in calendar months.
pub const MAX_RANGE_MONTHS: i32 = 3;

/// Day limit handed to the picker by the report form.
pub const REPORT_MAX_DAYS: u32 = 90;

/// Today's date in the app zone.
pub fn today_in_app_zone() -> NaiveDate {
    Utc::now().with_timezone(&APP_TIMEZONE).date_naive()
}

/// The app-zone calendar day an instant falls on.
pub fn app_date<T: TimeZone>(instant: &DateTime<T>) -> NaiveDate {
    instant.with_timezone(&APP_TIMEZONE).date_naive()
}

/// Midnight at the start of `date`, app zone.
pub fn start_of_day(date: NaiveDate) -> DateTime<Tz> {
    let local = date.and_time(NaiveTime::MIN);
    match APP_TIMEZONE.from_local_datetime(&local) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // No gap at midnight in this zone's history; read it as UTC+6 regardless.
        LocalResult::None => (local - Duration::hours(6)).and_utc().with_timezone(&APP_TIMEZONE),
    }
}

/// The last millisecond of `date`, app zone.
pub fn end_of_day(date: NaiveDate) -> DateTime<Tz> {
    start_of_day(date) + Duration::milliseconds(86_399_999)
}

/// Whole days from `from` to `to`. Negative when `to` is earlier.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Month-index difference, ignoring the day of month.
///
/// Jan 31 to Apr 1 is 3; Jan 1 to May 1 is 4.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    use chrono::Datelike;
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

/// A report range must be ordered and span at most [`MAX_RANGE_MONTHS`].
pub fn is_valid_range(from: NaiveDate, to: NaiveDate) -> bool {
    from <= to && months_between(from, to) <= MAX_RANGE_MONTHS
}

/// Renders an instant the way the backend expects timestamps:
/// `YYYY-MM-DDTHH:mm:ss+06:00`.
pub fn format_request_date<T: TimeZone>(instant: &DateTime<T>) -> String {
    instant
        .with_timezone(&APP_TIMEZONE)
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}

/// Which days the picker allows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisableRules {
    pub past_allowed: bool,
    pub future_allowed: bool,
    pub today_allowed: bool,
    /// Longest selectable range in days, counted from the pending start.
    pub max_days: Option<u32>,
}

impl Default for DisableRules {
    fn default() -> Self {
        Self {
            past_allowed: true,
            future_allowed: true,
            today_allowed: true,
            max_days: None,
        }
    }
}

/// Everything [`is_date_disabled`] looks at.
#[derive(Clone, Copy, Debug)]
pub struct DisableContext {
    pub today: NaiveDate,
    pub rules: DisableRules,
    /// Start of an in-progress selection.
    pub pending_from: Option<NaiveDate>,
    /// End of the in-progress selection, once picked.
    pub pending_to: Option<NaiveDate>,
}

impl DisableContext {
    pub fn new(today: NaiveDate, rules: DisableRules) -> Self {
        Self {
            today,
            rules,
            pending_from: None,
            pending_to: None,
        }
    }
}

/// Whether `candidate` is greyed out. The first rule that matches decides.
pub fn is_date_disabled(candidate: NaiveDate, ctx: &DisableContext) -> bool {
    let rules = &ctx.rules;

    if candidate == ctx.today && !rules.today_allowed {
        return true;
    }
    if candidate < ctx.today && !rules.past_allowed {
        return true;
    }
    if candidate > ctx.today && !rules.future_allowed {
        return true;
    }
    if let (Some(max_days), Some(from), None) = (rules.max_days, ctx.pending_from, ctx.pending_to)
    {
        let diff = days_between(from, candidate);
        return diff >= i64::from(max_days) || diff < 0;
    }
    false
}

/// [`is_date_disabled`] for an instant in any zone.
pub fn is_instant_disabled<T: TimeZone>(candidate: &DateTime<T>, ctx: &DisableContext) -> bool {
    is_date_disabled(app_date(candidate), ctx)
}

/// A range being picked, before Apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRangeSelection {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRangeSelection {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }
}

/// Shortens a two-ended selection to at most `max_days` days.
///
/// A range whose end lies `max_days` or more days after its start is cut to
/// end `max_days - 1` days after the start. One-ended selections pass through.
pub fn clamp_selection(selection: DateRangeSelection, max_days: Option<u32>) -> DateRangeSelection {
    match (max_days, selection.from, selection.to) {
        (Some(max_days), Some(from), Some(to))
            if max_days > 0 && days_between(from, to) >= i64::from(max_days) =>
        {
            DateRangeSelection {
                from: Some(from),
                to: Some(from + Duration::days(i64::from(max_days) - 1)),
            }
        }
        _ => selection,
    }
}

/// An applied range: start-of-day to end-of-day, app zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppliedRange {
    pub from: DateTime<Tz>,
    pub to: DateTime<Tz>,
}

impl AppliedRange {
    pub fn start_date(&self) -> NaiveDate {
        self.from.date_naive()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.to.date_naive()
    }

    /// `Jan 1, 2024 - Mar 30, 2024`, or a single day when both ends match.
    pub fn label(&self) -> String {
        let from = self.from.format("%b %-d, %Y").to_string();
        if self.start_date() == self.end_date() {
            from
        } else {
            format!("{} - {}", from, self.to.format("%b %-d, %Y"))
        }
    }
}

/// Promotes a selection on Apply. `None` when nothing was picked.
///
/// `from` is floored to start-of-day; `to` is ceiled to end-of-day and
/// defaults to the end of the `from` day.
pub fn apply_selection(selection: DateRangeSelection) -> Option<AppliedRange> {
    let from = selection.from?;
    let to = selection.to.unwrap_or(from);
    Some(AppliedRange {
        from: start_of_day(from),
        to: end_of_day(to),
    })
}

/// Open/select/apply/reset lifecycle of the range picker.
///
/// The pending selection lives only while the picker is open; it reaches the
/// filter state only through [`DateRangePicker::apply`].
#[derive(Clone, Debug)]
pub struct DateRangePicker {
    rules: DisableRules,
    pending: DateRangeSelection,
    applied: Option<AppliedRange>,
    open: bool,
}

impl DateRangePicker {
    pub fn new(rules: DisableRules) -> Self {
        Self {
            rules,
            pending: DateRangeSelection::default(),
            applied: None,
            open: false,
        }
    }

    /// Starts from dates already in the filter state.
    pub fn with_initial(rules: DisableRules, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        let initial = DateRangeSelection::new(from, to);
        Self {
            rules,
            pending: initial,
            applied: apply_selection(initial),
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn pending(&self) -> DateRangeSelection {
        self.pending
    }

    pub fn applied(&self) -> Option<AppliedRange> {
        self.applied
    }

    /// Opens the picker seeded with the applied range.
    pub fn open(&mut self) {
        self.pending = match self.applied {
            Some(applied) => {
                DateRangeSelection::new(Some(applied.start_date()), Some(applied.end_date()))
            }
            None => DateRangeSelection::default(),
        };
        self.open = true;
    }

    /// Records a click-selection, clamping it to the day limit.
    pub fn select(&mut self, selection: DateRangeSelection) {
        self.pending = clamp_selection(selection, self.rules.max_days);
    }

    pub fn is_disabled(&self, candidate: NaiveDate, today: NaiveDate) -> bool {
        let ctx = DisableContext {
            today,
            rules: self.rules,
            pending_from: self.pending.from,
            pending_to: self.pending.to,
        };
        is_date_disabled(candidate, &ctx)
    }

    /// Promotes the pending selection and closes the picker.
    pub fn apply(&mut self) -> Option<AppliedRange> {
        self.applied = apply_selection(self.pending);
        self.open = false;
        self.applied
    }

    /// Drops both pending and applied ranges.
    pub fn reset(&mut self) {
        self.pending = DateRangeSelection::default();
        self.applied = None;
    }

    /// Trigger text: the applied range or the placeholder.
    pub fn label(&self, placeholder: &str) -> String {
        self.applied
            .map(|a| a.label())
            .unwrap_or_else(|| placeholder.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ctx(today: NaiveDate, rules: DisableRules) -> DisableContext {
        DisableContext::new(today, rules)
    }

    #[test]
    fn today_rule_comes_first() {
        let today = date(2024, 6, 10);
        let rules = DisableRules {
            today_allowed: false,
            ..Default::default()
        };
        assert!(is_date_disabled(today, &ctx(today, rules)));
        assert!(!is_date_disabled(date(2024, 6, 9), &ctx(today, rules)));
        assert!(!is_date_disabled(date(2024, 6, 11), &ctx(today, rules)));
    }

    #[test]
    fn past_and_future_rules() {
        let today = date(2024, 6, 10);
        let no_past = DisableRules {
            past_allowed: false,
            ..Default::default()
        };
        assert!(is_date_disabled(date(2024, 6, 9), &ctx(today, no_past)));
        assert!(!is_date_disabled(today, &ctx(today, no_past)));

        let no_future = DisableRules {
            future_allowed: false,
            ..Default::default()
        };
        assert!(is_date_disabled(date(2024, 6, 11), &ctx(today, no_future)));
        assert!(!is_date_disabled(today, &ctx(today, no_future)));
    }

    #[test]
    fn past_disabling_is_monotonic() {
        let today = date(2024, 3, 1);
        let c = ctx(
            today,
            DisableRules {
                past_allowed: false,
                ..Default::default()
            },
        );
        let window: Vec<NaiveDate> = (-60..60).map(|i| today + Duration::days(i)).collect();
        for (i, day) in window.iter().enumerate() {
            if is_date_disabled(*day, &c) {
                assert!(
                    window[..i].iter().all(|earlier| is_date_disabled(*earlier, &c)),
                    "an earlier day than {} is enabled",
                    day
                );
            }
        }
    }

    #[test]
    fn max_days_window_from_pending_start() {
        let today = date(2024, 12, 31);
        let mut c = ctx(
            today,
            DisableRules {
                max_days: Some(90),
                ..Default::default()
            },
        );
        c.pending_from = Some(date(2024, 1, 1));

        assert!(!is_date_disabled(date(2024, 1, 1), &c));
        assert!(!is_date_disabled(date(2024, 3, 30), &c));
        assert!(is_date_disabled(date(2024, 3, 31), &c));
        assert!(is_date_disabled(date(2023, 12, 31), &c));

        c.pending_to = Some(date(2024, 1, 5));
        assert!(!is_date_disabled(date(2024, 6, 1), &c));
    }

    #[test]
    fn instants_are_judged_in_app_zone() {
        let today = date(2024, 6, 10);
        let c = ctx(
            today,
            DisableRules {
                future_allowed: false,
                ..Default::default()
            },
        );
        // 20:00 UTC on the 10th is already the 11th in Dhaka.
        let utc = Utc.with_ymd_and_hms(2024, 6, 10, 20, 0, 0).unwrap();
        assert!(is_instant_disabled(&utc, &c));

        // 23:00 on the 9th in New York is 09:00 on the 10th in Dhaka.
        let ny = FixedOffset::west_opt(4 * 3600).unwrap();
        let evening = ny.with_ymd_and_hms(2024, 6, 9, 23, 0, 0).unwrap();
        assert!(!is_instant_disabled(&evening, &c));
        assert_eq!(app_date(&evening), today);
    }

    #[test]
    fn clamp_long_selection() {
        let clamped = clamp_selection(
            DateRangeSelection::new(Some(date(2024, 1, 1)), Some(date(2024, 4, 10))),
            Some(90),
        );
        assert_eq!(clamped.from, Some(date(2024, 1, 1)));
        assert_eq!(clamped.to, Some(date(2024, 3, 30)));
        assert_eq!(days_between(date(2024, 1, 1), date(2024, 3, 30)), 89);
    }

    #[test]
    fn clamp_leaves_short_and_open_selections() {
        let short = DateRangeSelection::new(Some(date(2024, 1, 1)), Some(date(2024, 3, 30)));
        assert_eq!(clamp_selection(short, Some(90)), short);

        let open = DateRangeSelection::new(Some(date(2024, 1, 1)), None);
        assert_eq!(clamp_selection(open, Some(90)), open);

        let long = DateRangeSelection::new(Some(date(2024, 1, 1)), Some(date(2025, 1, 1)));
        assert_eq!(clamp_selection(long, None), long);
    }

    #[test]
    fn apply_floors_and_ceils() {
        let applied =
            apply_selection(DateRangeSelection::new(Some(date(2024, 1, 1)), Some(date(2024, 1, 31))))
                .unwrap();
        assert_eq!(format_request_date(&applied.from), "2024-01-01T00:00:00+06:00");
        assert_eq!(format_request_date(&applied.to), "2024-01-31T23:59:59+06:00");
        assert_eq!(
            applied.to.with_timezone(&Utc).to_rfc3339(),
            "2024-01-31T17:59:59.999+00:00"
        );
    }

    #[test]
    fn apply_single_day_defaults_end() {
        let applied =
            apply_selection(DateRangeSelection::new(Some(date(2024, 2, 29)), None)).unwrap();
        assert_eq!(applied.start_date(), date(2024, 2, 29));
        assert_eq!(applied.end_date(), date(2024, 2, 29));
        assert_eq!(applied.label(), "Feb 29, 2024");

        assert!(apply_selection(DateRangeSelection::default()).is_none());
    }

    #[test]
    fn month_index_difference() {
        assert_eq!(months_between(date(2024, 1, 31), date(2024, 4, 1)), 3);
        assert_eq!(months_between(date(2024, 1, 1), date(2024, 5, 1)), 4);
        assert_eq!(months_between(date(2023, 11, 15), date(2024, 2, 15)), 3);
        assert_eq!(months_between(date(2024, 3, 1), date(2024, 3, 31)), 0);
    }

    #[test]
    fn valid_report_ranges() {
        assert!(is_valid_range(date(2024, 1, 31), date(2024, 4, 30)));
        assert!(is_valid_range(date(2024, 2, 1), date(2024, 2, 1)));
        assert!(!is_valid_range(date(2024, 1, 1), date(2024, 5, 1)));
        assert!(!is_valid_range(date(2024, 6, 1), date(2023, 1, 1)));
    }

    #[test]
    fn picker_lifecycle() {
        let rules = DisableRules {
            future_allowed: false,
            max_days: Some(REPORT_MAX_DAYS),
            ..Default::default()
        };
        let today = date(2024, 6, 30);
        let mut picker = DateRangePicker::new(rules);
        assert_eq!(picker.label("Pick a date"), "Pick a date");

        picker.open();
        assert!(picker.is_open());
        picker.select(DateRangeSelection::new(Some(date(2024, 1, 1)), None));
        assert!(picker.is_disabled(date(2024, 4, 1), today));
        assert!(!picker.is_disabled(date(2024, 3, 30), today));

        picker.select(DateRangeSelection::new(Some(date(2024, 1, 1)), Some(date(2024, 4, 10))));
        let applied = picker.apply().unwrap();
        assert!(!picker.is_open());
        assert_eq!(applied.end_date(), date(2024, 3, 30));
        assert_eq!(picker.label("Pick a date"), "Jan 1, 2024 - Mar 30, 2024");

        picker.open();
        assert_eq!(
            picker.pending(),
            DateRangeSelection::new(Some(date(2024, 1, 1)), Some(date(2024, 3, 30)))
        );

        picker.reset();
        assert!(picker.applied().is_none());
        assert_eq!(picker.pending(), DateRangeSelection::default());
    }

    #[test]
    fn picker_seeded_from_filter_state() {
        let picker = DateRangePicker::with_initial(
            DisableRules::default(),
            Some(date(2024, 5, 1)),
            Some(date(2024, 5, 31)),
        );
        assert_eq!(picker.applied().unwrap().end_date(), date(2024, 5, 31));
    }
}
