use std::sync::Arc;

use schedugator::catalog::{Catalog, SectionOrder};
use schedugator::cli::Commands;
use schedugator::conflict::OverlapChecker;
use schedugator::planner::Planner;
use schedugator::settings::Settings;
use schedugator::solver::{GroupOrdering, Solver};
use schedugator::time::{OverlapPolicy, TimeUnit};
use schedugator::{
    CourseRequestGroup, MeetingBlock, PlanError, Section, execute, has_conflict, solve,
};

const CATALOG_JSON: &str = r#"[
  {
    "code": "COP3502C",
    "name": "Programming Fundamentals 1",
    "dept": "CISE",
    "sections": [
      {
        "classNum": 11111,
        "instructors": ["Ada Gator"],
        "credits": 4,
        "meetTimes": [
          {"meetDays": ["M", "W", "F"], "meetPeriodBegin": "3", "meetPeriodEnd": "4",
           "meetTimeBegin": "9:35 AM", "meetTimeEnd": "11:30 AM", "meetBuilding": "CSE", "meetRoom": "E119"}
        ]
      }
    ]
  },
  {
    "code": "MAC2312",
    "name": "Analytic Geometry and Calculus 2",
    "dept": "Mathematics",
    "sections": [
      {
        "classNum": 22222,
        "instructors": ["Bo Albert"],
        "meetTimes": [
          {"meetDays": ["M", "W", "F"], "meetPeriodBegin": "3", "meetPeriodEnd": "4",
           "meetTimeBegin": "9:35 AM", "meetTimeEnd": "11:30 AM", "meetBuilding": "LIT", "meetRoom": "109"}
        ]
      },
      {
        "classNum": 33333,
        "instructors": ["Cy Alligator"],
        "meetTimes": [
          {"meetDays": ["T", "R"], "meetPeriodBegin": "5", "meetPeriodEnd": "6",
           "meetTimeBegin": "11:45 AM", "meetTimeEnd": "1:40 PM", "meetBuilding": "LIT", "meetRoom": "101"}
        ]
      }
    ]
  },
  {
    "code": "PHY2048",
    "name": "Physics with Calculus 1",
    "dept": "Physics",
    "sections": [
      {
        "classNum": 44444,
        "meetTimes": [
          {"meetDays": ["R"], "meetPeriodBegin": "E1", "meetPeriodEnd": "E1"}
        ]
      }
    ]
  },
  {
    "code": "MUL2010",
    "name": "Experiencing Music",
    "dept": "Music",
    "sections": [
      {
        "classNum": 55555,
        "meetTimes": [
          {"meetDays": ["R"], "meetTimeBegin": "6:00 PM", "meetTimeEnd": "6:50 PM"}
        ]
      }
    ]
  }
]"#;

fn test_settings() -> Settings {
    Settings {
        catalog_path: "catalog.json".into(),
        debug: true,
        time_unit: TimeUnit::Minutes,
        overlap_policy: OverlapPolicy::Closed,
        group_ordering: GroupOrdering::AsGiven,
        section_order: SectionOrder::Catalog,
        node_limit: None,
        term_start: None,
        term_end: None,
        timezone: "America/New_York".to_string(),
    }
}

fn test_planner() -> Planner {
    let catalog = Catalog::from_json_str(CATALOG_JSON, TimeUnit::Minutes).unwrap();
    Planner::from_settings(Arc::new(catalog), &test_settings())
}

/// Small deterministic generator so the exhaustive checks below are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

const DAY_PATTERNS: [&str; 4] = ["MWF", "TR", "M", "W"];

fn random_groups(rng: &mut Lcg, group_count: usize) -> Vec<CourseRequestGroup> {
    let mut class_num = 0;
    (0..group_count)
        .map(|g| {
            let sections = (0..1 + rng.next(3))
                .map(|_| {
                    class_num += 1;
                    let begin = 1 + rng.next(6) as u8;
                    let end = begin + rng.next(2) as u8;
                    let days = DAY_PATTERNS[rng.next(DAY_PATTERNS.len() as u64) as usize];
                    let block = MeetingBlock::periods(days, begin, end);
                    Section::new(class_num, format!("GEN{g:04}"), vec![block])
                })
                .collect();
            CourseRequestGroup::new(format!("GEN{g:04}"), sections)
        })
        .collect()
}

/// Brute force over the full cartesian product.
fn any_conflict_free(checker: &OverlapChecker, groups: &[CourseRequestGroup]) -> bool {
    fn walk<'a>(
        checker: &OverlapChecker,
        groups: &'a [CourseRequestGroup],
        chosen: &mut Vec<&'a Section>,
    ) -> bool {
        let Some((first, rest)) = groups.split_first() else {
            return !checker.has_conflict(chosen.iter().copied());
        };
        for section in &first.sections {
            chosen.push(section);
            let found = walk(checker, rest, chosen);
            chosen.pop();
            if found {
                return true;
            }
        }
        false
    }
    walk(checker, groups, &mut Vec::new())
}

#[test]
fn test_backtracks_past_overlapping_section() {
    // Arrange
    let groups = vec![
        CourseRequestGroup::new(
            "COP3502C",
            vec![Section::new(1, "COP3502C", vec![MeetingBlock::periods("MWF", 3, 4)])],
        ),
        CourseRequestGroup::new(
            "MAC2312",
            vec![
                Section::new(2, "MAC2312", vec![MeetingBlock::periods("MWF", 3, 4)]),
                Section::new(3, "MAC2312", vec![MeetingBlock::periods("TR", 5, 6)]),
            ],
        ),
    ];

    // Act
    let schedule = solve(&groups).unwrap();

    // Assert
    assert_eq!(schedule.class_numbers(), vec![1, 3]);
}

#[test]
fn test_identical_single_sections_have_no_solution() {
    // Arrange
    let groups = vec![
        CourseRequestGroup::new(
            "AAA1000",
            vec![Section::new(1, "AAA1000", vec![MeetingBlock::periods("M", 1, 2)])],
        ),
        CourseRequestGroup::new(
            "BBB1000",
            vec![Section::new(2, "BBB1000", vec![MeetingBlock::periods("M", 1, 2)])],
        ),
    ];

    // Act
    let schedule = solve(&groups);

    // Assert
    assert!(schedule.is_none());
}

#[test]
fn test_evening_period_clashes_with_clock_time() {
    // Arrange
    let evening = Section::new(1, "PHY2048", vec![MeetingBlock::periods("R", 12, 12)]);
    let clock = Section::new(2, "MUL2010", vec![MeetingBlock::clock("R", "6:00 PM", "6:50 PM")]);

    // Act
    let conflicting = has_conflict(&[evening, clock]);

    // Assert
    assert!(conflicting);
}

#[test]
fn test_unknown_course_is_invalid_input() {
    // Arrange
    let planner = test_planner();

    // Act
    let result = planner.plan(&["COP3502C", "XYZ9999", "MAC2312"]);

    // Assert
    let err = result.unwrap_err();
    assert!(err.is_invalid_input());
    assert!(matches!(err, PlanError::UnknownCourses(ref codes) if codes == &["XYZ9999"]));
}

#[test]
fn test_catalog_snapshot_schedules_courses() {
    // Arrange
    let planner = test_planner();

    // Act
    let schedule = planner.plan(&["cop3502c", "MAC2312"]).unwrap().unwrap();

    // Assert
    assert_eq!(schedule.class_numbers(), vec![11111, 33333]);
    assert_eq!(schedule.sections()[0].instructors, vec!["Ada Gator".to_string()]);
}

#[test]
fn test_catalog_evening_and_clock_sections_conflict() {
    // Arrange
    let planner = test_planner();

    // Act
    let schedule = planner.plan(&["PHY2048", "MUL2010"]).unwrap();
    let reports = planner.conflicts(&[44444, 55555]).unwrap();

    // Assert
    assert!(schedule.is_none());
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].window.start, 1080);
    assert_eq!(reports[0].window.end, 1100);
}

#[test]
fn test_half_open_policy_allows_back_to_back() {
    // Arrange
    let first = Section::new(1, "AAA1000", vec![MeetingBlock::clock("M", "9:00 AM", "10:00 AM")]);
    let second = Section::new(2, "BBB1000", vec![MeetingBlock::clock("M", "10:00 AM", "11:00 AM")]);
    let closed = OverlapChecker::new(TimeUnit::Minutes, OverlapPolicy::Closed);
    let half_open = OverlapChecker::new(TimeUnit::Minutes, OverlapPolicy::HalfOpen);

    // Act & Assert
    assert!(closed.has_conflict([&first, &second]));
    assert!(!half_open.has_conflict([&first, &second]));
}

#[test]
fn test_malformed_times_never_conflict() {
    // Arrange
    let json = r#"[
      {"code":"AAA1000","name":"A","dept":"X","sections":[
        {"classNum":1,"meetTimes":[{"meetDays":["M"],"meetPeriodBegin":"soon","meetPeriodEnd":"later"}]}]},
      {"code":"BBB1000","name":"B","dept":"X","sections":[
        {"classNum":2,"meetTimes":[{"meetDays":["M"],"meetPeriodBegin":1,"meetPeriodEnd":11}]}]}
    ]"#;
    let catalog = Catalog::from_json_str(json, TimeUnit::Periods).unwrap();
    let planner = Planner::new(Arc::new(catalog), OverlapPolicy::Closed);

    // Act
    let schedule = planner.plan(&["AAA1000", "BBB1000"]).unwrap();

    // Assert
    assert_eq!(schedule.unwrap().class_numbers(), vec![1, 2]);
}

#[test]
fn test_reversed_clock_block_never_conflicts() {
    // Arrange
    let reversed = Section::new(
        1,
        "AAA1000",
        vec![MeetingBlock::clock("M", "11:00 AM", "9:00 AM")],
    );
    let morning = Section::new(
        2,
        "BBB1000",
        vec![MeetingBlock::clock("M", "9:30 AM", "10:20 AM")],
    );
    let groups = vec![
        CourseRequestGroup::new("AAA1000", vec![reversed]),
        CourseRequestGroup::new("BBB1000", vec![morning]),
    ];

    // Act
    let schedule = solve(&groups);

    // Assert
    assert_eq!(schedule.unwrap().class_numbers(), vec![1, 2]);
}

#[test]
fn test_tba_section_schedules_alongside_busy_day() {
    // Arrange
    let groups = vec![
        CourseRequestGroup::new(
            "IDS2935",
            vec![Section::new(1, "IDS2935", vec![MeetingBlock::tba("MWF")])],
        ),
        CourseRequestGroup::new(
            "COP3502C",
            vec![Section::new(2, "COP3502C", vec![MeetingBlock::periods("MWF", 1, 11)])],
        ),
    ];

    // Act
    let schedule = solve(&groups);

    // Assert
    assert_eq!(schedule.unwrap().class_numbers(), vec![1, 2]);
}

#[test]
fn test_evening_period_clashes_with_clock_time_on_period_axis() {
    // Arrange
    let catalog = Catalog::from_json_str(CATALOG_JSON, TimeUnit::Periods).unwrap();
    let planner = Planner::new(Arc::new(catalog), OverlapPolicy::Closed);

    // Act
    let schedule = planner.plan(&["PHY2048", "MUL2010"]).unwrap();
    let reports = planner.conflicts(&[44444, 55555]).unwrap();

    // Assert
    assert!(schedule.is_none());
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].window.start, 12);
    assert_eq!(reports[0].window.end, 12);
}

#[test]
fn test_solver_matches_exhaustive_search() {
    let mut rng = Lcg(7);
    for policy in [OverlapPolicy::Closed, OverlapPolicy::HalfOpen] {
        let checker = OverlapChecker::new(TimeUnit::Periods, policy);
        for ordering in [GroupOrdering::AsGiven, GroupOrdering::MostConstrainedFirst] {
            let solver = Solver::new(checker).with_ordering(ordering);
            for _ in 0..200 {
                // Arrange
                let group_count = 1 + rng.next(4) as usize;
                let groups = random_groups(&mut rng, group_count);

                // Act
                let schedule = solver.solve(&groups);

                // Assert
                assert_eq!(schedule.is_some(), any_conflict_free(&checker, &groups));
                if let Some(schedule) = schedule {
                    assert!(!checker.has_conflict(schedule.sections()));
                    assert_eq!(schedule.len(), groups.len());
                    for (section, group) in schedule.sections().iter().zip(&groups) {
                        assert!(group.sections.contains(section));
                    }
                }
            }
        }
    }
}

#[test]
fn test_solver_is_deterministic() {
    // Arrange
    let groups = random_groups(&mut Lcg(42), 5);
    let solver = Solver::new(OverlapChecker::new(TimeUnit::Periods, OverlapPolicy::Closed));

    // Act
    let first = solver.solve(&groups);
    let second = solver.solve(&groups);

    // Assert
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_plans_do_not_interfere() {
    // Arrange
    let planner = test_planner();

    // Act
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let planner = &planner;
                scope.spawn(move || {
                    if i % 2 == 0 {
                        planner.plan(&["COP3502C", "MAC2312"]).unwrap()
                    } else {
                        planner.plan(&["PHY2048", "MUL2010"]).unwrap()
                    }
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Assert
    for (i, result) in results.iter().enumerate() {
        if i % 2 == 0 {
            assert_eq!(result.as_ref().unwrap().class_numbers(), vec![11111, 33333]);
        } else {
            assert!(result.is_none());
        }
    }
}

#[tokio::test]
async fn test_execute_solve_writes_calendar() {
    // Arrange
    let planner = test_planner();
    let mut settings = test_settings();
    settings.term_start = chrono::NaiveDate::from_ymd_opt(2026, 1, 12);
    settings.term_end = chrono::NaiveDate::from_ymd_opt(2026, 4, 22);
    let path = std::env::temp_dir().join(format!("schedugator-{}.ics", std::process::id()));
    let command = Commands::Solve {
        codes: vec!["COP3502C".to_string(), "MAC2312".to_string()],
        ordering: None,
        section_order: None,
        node_limit: None,
        ical: Some(path.clone()),
    };

    // Act
    let output = execute(command, &planner, &settings).await.unwrap();

    // Assert
    let report: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(report["success"], true);
    assert_eq!(report["courses_scheduled"], 2);
    let calendar = tokio::fs::read_to_string(&path).await.unwrap();
    let _ = tokio::fs::remove_file(&path).await;
    assert!(calendar.contains("BEGIN:VCALENDAR"));
    assert!(calendar.contains("COP3502C - Programming Fundamentals 1"));
    assert!(calendar.contains("BYDAY=TU"));
}

#[tokio::test]
async fn test_execute_solve_calendar_needs_term() {
    // Arrange
    let planner = test_planner();
    let command = Commands::Solve {
        codes: vec!["COP3502C".to_string()],
        ordering: None,
        section_order: None,
        node_limit: None,
        ical: Some(std::env::temp_dir().join("schedugator-unused.ics")),
    };

    // Act
    let result = execute(command, &planner, &test_settings()).await;

    // Assert
    assert!(result.is_err());
}

#[tokio::test]
async fn test_execute_conflicts_reports_pairs() {
    // Arrange
    let planner = test_planner();
    let command = Commands::Conflicts {
        class_nums: vec![11111, 22222, 33333],
    };

    // Act
    let output = execute(command, &planner, &test_settings()).await.unwrap();

    // Assert
    let report: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(report["conflict_count"], 1);
    assert_eq!(report["conflicts"][0]["first"]["classNum"], 11111);
    assert_eq!(report["conflicts"][0]["second"]["classNum"], 22222);
}

#[tokio::test]
async fn test_execute_unknown_section_fails() {
    // Arrange
    let planner = test_planner();
    let command = Commands::Conflicts { class_nums: vec![99999] };

    // Act
    let result = execute(command, &planner, &test_settings()).await;

    // Assert
    assert!(result.is_err());
}
