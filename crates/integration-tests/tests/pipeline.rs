//! End-to-end export runs against scripted API responses.

use atvenu_export::flatten::{ShowRecord, flatten_transactions};
use atvenu_export::pipeline::{
    export_counts, export_shows, export_shows_with_changes, export_totals, export_transactions,
};
use atvenu_export::testing::ScriptedTransport;
use atvenu_export::{ChangeReport, ExportError, LeafKind, RunScope, TreeBuilder, TreeOptions};
use atvenu_export_core::DateRange;
use atvenu_export_integration_tests::{accounts_page, client, counts_page, date, page, read_lines};
use serde_json::json;

/// Two accounts, two tours on the first, shows on both sides of 2022-01-01.
fn transactions_script() -> ScriptedTransport {
    ScriptedTransport::new()
        .route(
            "accounts",
            "",
            None,
            accounts_page(json!([{"uuid": "a1", "name": "The Band"}]), Some("ac1")),
        )
        .route(
            "accounts",
            "",
            Some("ac1"),
            accounts_page(json!([{"uuid": "a2", "name": "Opener"}]), None),
        )
        .route(
            "tours",
            "a1",
            None,
            page("account", "tours", json!([{"uuid": "t1", "name": "Winter"}, {"uuid": "t2", "name": "Spring"}]), None),
        )
        .route("tours", "a2", None, page("account", "tours", json!([{"uuid": "t3", "name": "Support"}]), None))
        .route(
            "shows",
            "t1",
            None,
            page(
                "tour",
                "shows",
                json!([
                    {"uuid": "s_old", "showDate": "2021-12-31"},
                    {"uuid": "s1", "showDate": "2022-01-01",
                     "location": {"city": "Austin", "stateProvince": "TX", "country": "US", "capacity": 1200}}
                ]),
                Some("sc1"),
            ),
        )
        .route(
            "shows",
            "t1",
            Some("sc1"),
            page("tour", "shows", json!([{"uuid": "s_undated"}]), None),
        )
        .route(
            "shows",
            "t2",
            None,
            page("tour", "shows", json!([{"uuid": "s2", "showDate": "2022-04-10", "capacity": 800}]), None),
        )
        .route("shows", "t3", None, page("tour", "shows", json!([{"uuid": "s3", "showDate": "2022-05-05"}]), None))
        .route(
            "transactions",
            "s1",
            None,
            page(
                "show",
                "itemizedTransactions",
                json!([
                    {"itemName": "Tee", "soldQuantity": 2, "grossSoldAmount": "70.00"},
                    {"itemName": "Hat", "soldQuantity": 1, "modifiers": [{"modifierName": "Signed", "grossAmount": "5.00"}]}
                ]),
                Some("tc1"),
            ),
        )
        .route(
            "transactions",
            "s1",
            Some("tc1"),
            page("show", "itemizedTransactions", json!([{"itemName": "Tee", "soldQuantity": 1}]), None),
        )
        .route(
            "transactions",
            "s2",
            None,
            page("show", "itemizedTransactions", json!([{"itemName": "Poster", "soldQuantity": 4}]), None),
        )
        .route(
            "transactions",
            "s3",
            None,
            page("show", "itemizedTransactions", json!([{"itemName": "Tee", "soldQuantity": 5}]), None),
        )
}

fn since_2022() -> RunScope {
    RunScope::new(DateRange::starting(date(2022, 1, 1)))
}

#[tokio::test]
async fn test_transactions_export_walks_every_level() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("transactions.csv");
    let client = client(transactions_script());

    let summary = export_transactions(&client, &since_2022(), &path)
        .await
        .expect("export should succeed");

    assert_eq!(summary.accounts, 2);
    assert_eq!(summary.shows, 3);
    assert_eq!(summary.rows, 5);

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("bandName,tourName,showDate,showEndDate,attendance,capacity,city"));
    assert!(lines[1].starts_with("The Band,Winter,2022-01-01,,,,Austin,US,TX,"));
    assert!(lines[1].contains(",70.00,"));
    assert!(lines[2].contains(r#""[{""modifierName"":""Signed"""#));
    assert!(lines[3].starts_with("The Band,Winter,2022-01-01"));
    assert!(lines[4].starts_with("The Band,Spring,2022-04-10,,,800,"));
    assert!(lines[5].starts_with("Opener,Support,2022-05-05"));

    // Shows outside the range never have their leaves requested.
    let leaf_shows: Vec<_> = client
        .transport()
        .requests_for("transactions")
        .iter()
        .filter_map(|r| r.uuid().map(str::to_string))
        .collect();
    assert!(!leaf_shows.iter().any(|s| s == "s_old" || s == "s_undated"));
}

#[tokio::test]
async fn test_account_filter_limits_tree() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("transactions.csv");
    let client = client(transactions_script());

    let summary = export_transactions(&client, &since_2022().with_account("Opener"), &path)
        .await
        .expect("export should succeed");

    assert_eq!(summary.accounts, 1);
    assert_eq!(summary.rows, 1);
    assert!(client.transport().requests_for("tours").iter().all(|r| r.uuid() == Some("a2")));
}

#[tokio::test]
async fn test_bounded_range_uses_overlap_query_and_excludes_end() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("transactions.csv");
    let transport = ScriptedTransport::new()
        .route("accounts", "", None, accounts_page(json!([{"uuid": "a1", "name": "The Band"}]), None))
        .route("tours", "a1", None, page("account", "tours", json!([{"uuid": "t1", "name": "Winter"}]), None))
        .route(
            "showsOverlapping",
            "t1",
            None,
            page(
                "tour",
                "shows",
                json!([
                    {"uuid": "s1", "showDate": "2022-01-31"},
                    {"uuid": "s2", "showDate": "2022-02-01", "showEndDate": "2022-02-02"}
                ]),
                None,
            ),
        )
        .route(
            "transactions",
            "s1",
            None,
            page("show", "itemizedTransactions", json!([{"itemName": "Tee", "soldQuantity": 1}]), None),
        );
    let client = client(transport);
    let range = DateRange::new(date(2022, 1, 1), Some(date(2022, 2, 1))).expect("valid range");

    let summary = export_transactions(&client, &RunScope::new(range), &path)
        .await
        .expect("export should succeed");

    assert_eq!(summary.rows, 1);
    let request = &client.transport().requests_for("showsOverlapping")[0];
    assert_eq!(request.variables["startDate"], json!("2022-01-01"));
    assert_eq!(request.variables["endDate"], json!("2022-01-31"));
}

#[tokio::test]
async fn test_totals_export_merges_every_show() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("item_totals.csv");

    export_totals(&client(transactions_script()), &since_2022(), &path)
        .await
        .expect("export should succeed");

    assert_eq!(
        read_lines(&path),
        ["itemName,soldQuantity", "Tee,8", "Hat,1", "Poster,4"]
    );
}

#[tokio::test]
async fn test_failed_run_writes_nothing() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("transactions.csv");
    let transport = ScriptedTransport::new()
        .route("accounts", "", None, accounts_page(json!([{"uuid": "a2", "name": "Opener"}]), None))
        .route("tours", "a2", None, page("account", "tours", json!([{"uuid": "t3", "name": "Support"}]), None))
        .route("shows", "t3", None, page("tour", "shows", json!([{"uuid": "s3", "showDate": "2022-05-05"}]), None))
        .route_status("transactions", "s3", None, 500);

    let err = export_transactions(&client(transport), &since_2022(), &path)
        .await
        .expect_err("leaf failure must abort the run");

    assert!(matches!(err, ExportError::Transport { .. }));
    assert!(!path.exists());
}

fn counts_script() -> ScriptedTransport {
    counts_script_with(true)
}

/// Two accounts; the second account's catalogue fails with a 500 unless
/// `opener_catalogue` is set.
fn counts_script_with(opener_catalogue: bool) -> ScriptedTransport {
    let catalogue = |variant: &str, price: &str| {
        page(
            "account",
            "merchItems",
            json!([{
                "uuid": "item_1",
                "name": "Tour Tee",
                "category": "Apparel",
                "productType": {"name": "T-Shirt"},
                "merchVariants": [{"uuid": variant, "sku": "TT-S", "size": "S", "price": price}]
            }]),
            None,
        )
    };

    let script = ScriptedTransport::new()
        .route(
            "accounts",
            "",
            None,
            accounts_page(json!([{"uuid": "a1", "name": "The Band"}, {"uuid": "a2", "name": "Opener"}]), None),
        )
        .route("tours", "a1", None, page("account", "tours", json!([{"uuid": "t1", "name": "Winter"}]), None))
        .route("tours", "a2", None, page("account", "tours", json!([{"uuid": "t2", "name": "Support"}]), None))
        .route(
            "shows",
            "t1",
            None,
            page(
                "tour",
                "shows",
                json!([{"uuid": "s1", "showDate": "2022-03-01", "attendance": 900, "currencyFormat": {"code": "USD"},
                        "location": {"city": "Austin", "stateProvince": "TX", "country": "US", "capacity": 1200}}]),
                None,
            ),
        )
        .route("shows", "t2", None, page("tour", "shows", json!([{"uuid": "s2", "showDate": "2022-03-02"}]), None))
        .route(
            "counts",
            "s1",
            None,
            counts_page(
                json!([
                    {"merchVariantUuid": "v1", "countIn": 10, "countOut": 2, "comps": 1, "merchAdds": [{"quantity": 3}, {"quantity": 2}]},
                    {"merchVariantUuid": "retired", "countIn": 8}
                ]),
                None,
            ),
        )
        .route(
            "counts",
            "s2",
            None,
            counts_page(json!([{"merchVariantUuid": "v2", "countIn": 5, "countOut": 5, "priceOverride": "20.00"}]), None),
        )
        .route("merchItems", "a1", None, catalogue("v1", "30.00"));

    if opener_catalogue {
        script.route("merchItems", "a2", None, catalogue("v2", "25.00"))
    } else {
        script.route_status("merchItems", "a2", None, 500)
    }
}

#[tokio::test]
async fn test_counts_export_appends_accounts_under_one_header() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("counts.csv");
    std::fs::write(&path, "left over from an earlier run\n").expect("Failed to seed file");

    let summary = export_counts(&client(counts_script()), &since_2022(), &path)
        .await
        .expect("export should succeed");

    assert_eq!(summary.rows, 2);
    assert_eq!(summary.unmatched, 1);
    assert_eq!(
        read_lines(&path),
        [
            "artistName,tourName,showDate,showEndDate,state,attendance,capacity,city,stateProvince,country,currencyCode,category,productType,variantName,variantSku,variantSize,variantPrice,soldQuantity",
            "The Band,Winter,2022-03-01,,,900,1200,Austin,TX,US,USD,Apparel,T-Shirt,Tour Tee,TT-S,S,30.00,12",
            "Opener,Support,2022-03-02,,,,,,,,,Apparel,T-Shirt,Tour Tee,TT-S,S,20.00,0",
        ]
    );
}

#[tokio::test]
async fn test_counts_failure_keeps_finished_accounts() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("counts.csv");
    let client = client(counts_script_with(false));

    let err = export_counts(&client, &since_2022(), &path)
        .await
        .expect_err("second account fails");

    assert!(matches!(err, ExportError::Transport { .. }));
    let lines = read_lines(&path);
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("The Band,Winter"));
}

#[tokio::test]
async fn test_shows_listing_is_sorted_and_only_open_tours() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("2024-01-01.csv");
    let transport = ScriptedTransport::new()
        .route(
            "accounts",
            "",
            None,
            accounts_page(json!([{"uuid": "a1", "name": "Headliner"}, {"uuid": "a2", "name": "Opener"}]), None),
        )
        .route("tours", "a1", None, page("account", "tours", json!([{"uuid": "t1", "name": "Big"}]), None))
        .route("tours", "a2", None, page("account", "tours", json!([{"uuid": "t2", "name": "Small"}]), None))
        .route(
            "showsOverlapping",
            "t1",
            None,
            page(
                "tour",
                "shows",
                json!([
                    {"uuid": "s1", "showDate": "2024-06-01",
                     "location": {"name": "Arena", "city": "Denver", "stateProvince": "CO", "country": "US"}},
                    {"uuid": "s_late", "showDate": "2025-02-01"}
                ]),
                None,
            ),
        )
        .route(
            "showsOverlapping",
            "t2",
            None,
            page(
                "tour",
                "shows",
                json!([{"uuid": "s2", "showDate": "2024-03-15",
                        "location": {"name": "Club", "city": "Reno", "stateProvince": "NV", "country": "US"}}]),
                None,
            ),
        );
    let client = client(transport);
    let scope = RunScope::new(DateRange::days_from(date(2024, 1, 1), 31 + 29 + 31 + 30 + 31 + 30));

    let summary = export_shows(&client, &scope, &path)
        .await
        .expect("export should succeed");

    assert_eq!(summary.rows, 2);
    assert_eq!(
        read_lines(&path),
        [
            "date,band,city,state,venue,country",
            "2024-03-15,Opener,Reno,NV,Club,US",
            "2024-06-01,Headliner,Denver,CO,Arena,US",
        ]
    );
    assert!(
        client
            .transport()
            .requests_for("tours")
            .iter()
            .all(|r| r.variables["open"] == json!(true))
    );
}

#[tokio::test]
async fn test_repeated_runs_produce_identical_output() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let first_path = dir.path().join("first.csv");
    let second_path = dir.path().join("second.csv");

    export_transactions(&client(transactions_script()), &since_2022(), &first_path)
        .await
        .expect("first run should succeed");
    export_transactions(&client(transactions_script()), &since_2022(), &second_path)
        .await
        .expect("second run should succeed");

    let first = std::fs::read(&first_path).expect("Failed to read first CSV");
    let second = std::fs::read(&second_path).expect("Failed to read second CSV");
    assert_eq!(first, second);

    let options = TreeOptions {
        range: Some(since_2022().range),
        leaves: LeafKind::Transactions,
        ..TreeOptions::default()
    };
    let mut flattened = Vec::new();
    for _ in 0..2 {
        let client = client(transactions_script());
        let accounts = TreeBuilder::new(&client, options.clone())
            .build_all()
            .await
            .expect("tree should build");
        flattened.push(flatten_transactions(&accounts, &since_2022().range));
    }
    assert_eq!(flattened[0].len(), 5);
    assert_eq!(flattened[0], flattened[1]);
}

/// Two open tours with one show each, inside the 2024 window.
fn listing_script() -> ScriptedTransport {
    ScriptedTransport::new()
        .route(
            "accounts",
            "",
            None,
            accounts_page(json!([{"uuid": "a1", "name": "Headliner"}]), None),
        )
        .route(
            "tours",
            "a1",
            None,
            page("account", "tours", json!([{"uuid": "t1", "name": "Big"}]), None),
        )
        .route(
            "showsOverlapping",
            "t1",
            None,
            page(
                "tour",
                "shows",
                json!([
                    {"uuid": "s1", "showDate": "2024-06-01",
                     "location": {"name": "Arena", "city": "Denver", "stateProvince": "CO", "country": "US"}},
                    {"uuid": "s2", "showDate": "2024-07-04",
                     "location": {"name": "Club", "city": "Reno", "stateProvince": "NV", "country": "US"}}
                ]),
                None,
            ),
        )
}

fn listed(day: chrono::NaiveDate, venue: &str, city: &str, state: &str) -> ShowRecord {
    ShowRecord {
        date: day,
        band: "Headliner".to_string(),
        city: Some(city.to_string()),
        state: Some(state.to_string()),
        venue: Some(venue.to_string()),
        country: Some("US".to_string()),
    }
}

#[tokio::test]
async fn test_shows_report_only_new_shows() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let listing = dir.path().join("2024-05-31.csv");
    let changes = dir.path().join("changes.csv");
    let report = ChangeReport {
        previous: vec![listed(date(2024, 6, 1), "Arena", "Denver", "CO")],
        first_seen: date(2024, 5, 31),
        output: changes.clone(),
    };
    let scope = RunScope::new(DateRange::days_from(date(2024, 1, 1), 365));

    let summary = export_shows_with_changes(&client(listing_script()), &scope, &listing, &report)
        .await
        .expect("shows export should succeed");

    assert_eq!(summary.rows, 2);
    assert_eq!(summary.new_shows, 1);
    assert_eq!(
        read_lines(&changes),
        [
            "date,band,city,state,venue,country,firstSeen",
            "2024-07-04,Headliner,Reno,NV,Club,US,2024-05-31",
        ]
    );
}

#[tokio::test]
async fn test_unchanged_listing_writes_no_changes_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let listing = dir.path().join("latest.csv");
    let changes = dir.path().join("changes.csv");
    let report = ChangeReport {
        previous: vec![
            listed(date(2024, 7, 4), "Club", "Reno", "NV"),
            listed(date(2024, 6, 1), "Arena", "Denver", "CO"),
        ],
        first_seen: date(2024, 5, 31),
        output: changes.clone(),
    };
    let scope = RunScope::new(DateRange::days_from(date(2024, 1, 1), 365));

    let summary = export_shows_with_changes(&client(listing_script()), &scope, &listing, &report)
        .await
        .expect("no new shows is not an error");

    assert_eq!(summary.new_shows, 0);
    assert!(!changes.exists());
    assert_eq!(read_lines(&listing).len(), 3);
}
