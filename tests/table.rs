use listings_explorer::table::{group_thousands, render_table};

#[test]
fn render_table_right_aligns_numeric_columns() {
    let headers = vec!["count".to_string(), "room_type".to_string()];
    let rows = vec![
        vec!["7".to_string(), "Entire home/apt".to_string()],
        vec!["3".to_string(), "Private room".to_string()],
    ];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(
        lines,
        vec![
            "count  room_type",
            "-----  ---------------",
            "    7  Entire home/apt",
            "    3  Private room",
        ]
    );
}

#[test]
fn render_table_treats_percentages_and_nan_as_numbers() {
    let headers = vec!["percent".to_string(), "r".to_string()];
    let rows = vec![
        vec!["50.00%".to_string(), "NaN".to_string()],
        vec!["5.00%".to_string(), "1.00".to_string()],
    ];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[2], " 50.00%   NaN");
    assert_eq!(lines[3], "  5.00%  1.00");
}

#[test]
fn render_table_pads_short_rows() {
    let headers = vec!["column".to_string(), "q1".to_string()];
    let rows = vec![vec!["minimum_nights".to_string()]];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "minimum_nights");
}

#[test]
fn render_table_normalizes_control_characters() {
    let headers = vec!["name".to_string()];
    let rows = vec![vec!["Cozy\nflat\tnear lakes".to_string()]];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "Cozy flat near lakes");
}

#[test]
fn render_table_handles_unicode_and_ansi_widths() {
    let headers = vec!["kvarter".to_string(), "status".to_string()];
    let rows = vec![vec![
        "Nørrebro".to_string(),
        "\u{1b}[31mERR\u{1b}[0m".to_string(),
    ]];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[0], "kvarter   status");
    assert_eq!(lines[2], "Nørrebro  \u{1b}[31mERR\u{1b}[0m");
}

#[test]
fn group_thousands_formats_row_totals() {
    assert_eq!(group_thousands(21_345), "21,345");
    assert_eq!(group_thousands(100), "100");
}
