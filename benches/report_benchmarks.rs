use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use std::hint::black_box;
use uuid::Uuid;

use workhours::auth::UserRole;
use workhours::records::{ExpenseEntry, User, VacationEntry, VacationType, WorkHoursEntry};
use workhours::report::{build_report, Period};
use workhours::store::Snapshot;

/// A team of `users` people with a year of weekday shifts each
fn snapshot(users: usize) -> Snapshot {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let five = NaiveTime::from_hms_opt(17, 30, 0).unwrap();

    let mut snap = Snapshot::default();
    for n in 0..users {
        let user = User {
            id: Uuid::new_v4(),
            username: format!("user{n}"),
            role: UserRole::Employee,
            created_at: Utc::now(),
        };
        for day in 0..365 {
            let date = start + Duration::days(day);
            match day % 7 {
                5 | 6 => {}
                3 if day % 28 == 3 => snap.vacations.push(VacationEntry {
                    id: Uuid::new_v4(),
                    user_id: user.id,
                    vacation_date: date,
                    vacation_type: VacationType::Sick,
                    created_at: Utc::now(),
                }),
                _ => snap.work_hours.push(WorkHoursEntry {
                    id: Uuid::new_v4(),
                    user_id: user.id,
                    work_date: date,
                    start_time: nine,
                    end_time: five,
                    created_at: Utc::now(),
                }),
            }
            if day % 10 == 0 {
                snap.expenses.push(ExpenseEntry {
                    id: Uuid::new_v4(),
                    user_id: user.id,
                    expense_date: date,
                    description: "Lunch".to_string(),
                    amount: Decimal::new(1250, 2),
                    created_at: Utc::now(),
                });
            }
        }
        snap.users.push(user);
    }
    snap
}

fn bench_build_report(c: &mut Criterion) {
    let small = snapshot(10);
    let large = snapshot(100);
    let march = Period::parse_month("2025-03").unwrap();

    c.bench_function("report_all_time_10_users", |b| {
        b.iter(|| build_report(black_box(small.clone()), Period::all_time()).unwrap())
    });

    c.bench_function("report_month_100_users", |b| {
        b.iter(|| build_report(black_box(large.clone()), march.clone()).unwrap())
    });
}

fn bench_parse_month(c: &mut Criterion) {
    c.bench_function("parse_month", |b| {
        b.iter(|| Period::parse_month(black_box("2024-02")))
    });
}

criterion_group!(benches, bench_build_report, bench_parse_month);
criterion_main!(benches);
