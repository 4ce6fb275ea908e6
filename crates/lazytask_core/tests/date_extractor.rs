use chrono::NaiveDate;
use lazytask_core::extract::date::DateExtractor;
use lazytask_core::ParserConfig;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn extractor() -> DateExtractor {
    DateExtractor::new(&ParserConfig::default())
}

// 2024-11-17 is a Sunday; 2024-11-20 is a Wednesday.
const SUNDAY: (i32, u32, u32) = (2024, 11, 17);
const WEDNESDAY: (i32, u32, u32) = (2024, 11, 20);

fn sunday() -> NaiveDate {
    date(SUNDAY.0, SUNDAY.1, SUNDAY.2)
}

fn wednesday() -> NaiveDate {
    date(WEDNESDAY.0, WEDNESDAY.1, WEDNESDAY.2)
}

#[test]
fn iso_dates_are_exact_with_full_confidence() {
    for (text, expected) in [
        ("report 2024-03-20", date(2024, 3, 20)),
        ("2025-01-05 exam", date(2025, 1, 5)),
        ("paper by 2024-12-31", date(2024, 12, 31)),
        ("leap day 2024-02-29", date(2024, 2, 29)),
    ] {
        let found = extractor().extract(text, sunday()).unwrap();
        assert_eq!(found.date, expected, "{text}");
        assert_eq!(found.confidence, 1.0, "{text}");
    }
}

#[test]
fn iso_match_is_removed_from_remaining_text() {
    let found = extractor()
        .extract("paper by 2024-12-31 on regression", sunday())
        .unwrap();
    assert_eq!(found.remaining_text, "paper on regression");
}

#[test]
fn month_day_rolls_into_next_year_when_past() {
    let upcoming = extractor().extract("exam 12-05", sunday()).unwrap();
    assert_eq!(upcoming.date, date(2024, 12, 5));
    assert_eq!(upcoming.confidence, 0.9);

    let rolled = extractor().extract("due 03-01 thesis", sunday()).unwrap();
    assert_eq!(rolled.date, date(2025, 3, 1));
    assert_eq!(rolled.confidence, 1.0);
    assert_eq!(rolled.remaining_text, "thesis");
}

#[test]
fn relative_days_resolve_against_reference() {
    let cases = [
        ("do it today", 0),
        ("finish tomorrow", 1),
        ("the day after tomorrow", 2),
        ("in 5 days", 5),
        ("10 days later", 10),
    ];
    for (text, days) in cases {
        let found = extractor().extract(text, wednesday()).unwrap();
        assert_eq!(
            found.date,
            wednesday() + chrono::Days::new(days),
            "{text}"
        );
        assert_eq!(found.confidence, 0.9, "{text}");
    }
}

#[test]
fn marker_raises_relative_confidence() {
    let found = extractor()
        .extract("send the draft before tomorrow", wednesday())
        .unwrap();
    assert_eq!(found.confidence, 0.95);
    assert_eq!(found.remaining_text, "send the draft");
}

#[test]
fn weekend_expressions_use_monday_based_weeks() {
    let this = extractor().extract("this weekend", wednesday()).unwrap();
    assert_eq!(this.date, date(2024, 11, 23));
    assert_eq!(this.confidence, 0.8);

    let next = extractor().extract("next weekend", wednesday()).unwrap();
    assert_eq!(next.date, date(2024, 11, 30));

    let sunday_this = extractor().extract("this weekend", sunday()).unwrap();
    assert_eq!(sunday_this.date, sunday());
}

#[test]
fn month_end_expressions_pick_last_calendar_day() {
    let this = extractor()
        .extract("by end of this month", wednesday())
        .unwrap();
    assert_eq!(this.date, date(2024, 11, 30));
    assert_eq!(this.confidence, 0.9);

    let the = extractor().extract("end of the month", wednesday()).unwrap();
    assert_eq!(the.date, date(2024, 11, 30));

    let leap = extractor()
        .extract("end of next month", date(2024, 1, 15))
        .unwrap();
    assert_eq!(leap.date, date(2024, 2, 29));
}

#[test]
fn weekday_expressions_never_resolve_to_today() {
    let same_day = extractor().extract("this wednesday", wednesday()).unwrap();
    assert_eq!(same_day.date, date(2024, 11, 27));

    let later = extractor().extract("this friday", wednesday()).unwrap();
    assert_eq!(later.date, date(2024, 11, 22));

    let next = extractor().extract("next friday", wednesday()).unwrap();
    assert_eq!(next.date, date(2024, 11, 29));

    let earlier = extractor().extract("next monday", wednesday()).unwrap();
    assert_eq!(earlier.date, date(2024, 12, 2));
}

#[test]
fn invalid_calendar_capture_falls_through_to_next_pattern() {
    let found = extractor()
        .extract("13-45 meeting notes tomorrow", wednesday())
        .unwrap();
    assert_eq!(found.date, date(2024, 11, 21));
}

#[test]
fn invalid_capture_falls_through_to_later_match_of_same_pattern() {
    let found = extractor()
        .extract(
            "draft was 2024-02-30, submit by 2024-03-05",
            date(2024, 1, 1),
        )
        .unwrap();
    assert_eq!(found.date, date(2024, 3, 5));
    assert_eq!(found.confidence, 1.0);
    assert_eq!(found.remaining_text, "draft was 2024-02-30, submit");

    let month_day = extractor()
        .extract("02-30 or 03-05", date(2024, 1, 1))
        .unwrap();
    assert_eq!(month_day.date, date(2024, 3, 5));
}

#[test]
fn no_date_expression_is_none() {
    assert!(extractor().extract("write the essay", wednesday()).is_none());
    assert!(extractor().extract("", wednesday()).is_none());
}
