/// Preprocessing Session Example
///
/// This example demonstrates:
/// - Loading a CSV dataset into a session
/// - Inspecting columns with descriptive statistics
/// - Applying preprocessing actions and undoing them
/// - Exporting the result
///
/// Run with `RUST_LOG=debug` to see each action logged.

use minetable::{
    stats, Action, BinningMethod, MissingStrategy, NormalizeMethod, OutlierMethod, RedundancyAxis,
    Session, SessionConfig,
};

const WEATHER: &str = "\
time,lon,lat,PSurf,Qair,Rainf,Snowf,Tair,Wind
2001-01-10 00:00:00,2.5,48.5,101200,0.003,0.0,0.2,274.1,4.1
2001-01-10 00:00:00,2.5,48.5,101200,0.003,0.0,0.2,274.1,4.1
2001-04-12 00:00:00,2.5,48.5,100900,0.006,1.2,0.0,285.3,3.2
2001-04-13 00:00:00,2.5,48.5,100850,NA,0.4,0.0,286.0,2.9
2001-07-02 00:00:00,2.5,48.5,100700,0.011,0.0,0.0,297.8,2.2
2001-07-03 00:00:00,3.0,48.5,100650,0.012,3.1,0.0,299.2,48.0
2001-10-20 00:00:00,3.0,48.5,101000,0.008,2.2,0.0,284.4,5.5
";

fn main() -> minetable::Result<()> {
    env_logger::init();

    println!("=== MineTable Preprocessing Session Example ===\n");

    // 1. Load the dataset
    println!("1. Loading dataset...");
    let mut session = Session::new(SessionConfig::from_env());
    let table = session.load_csv("weather", WEATHER)?;
    println!("   {:?}\n", table);

    // 2. Profile the columns
    println!("2. Column profile:");
    for p in session.profile()? {
        println!(
            "   {:<6} {:?}, {} missing, {} distinct",
            p.column, p.column_type, p.missing, p.unique
        );
    }
    println!();

    // 3. Statistics on one column
    println!("3. Wind statistics:");
    let ct = session.central_tendency("Wind")?;
    println!("   mean {:.2}, median {:.2}, mode {:?}", ct.mean, ct.median, ct.mode);
    let q = session.quantiles("Wind")?;
    println!(
        "   Q1 {:.2}, Q3 {:.2}, fences [{:.2}, {:.2}], outlier rows {:?}\n",
        q.summary.q1, q.summary.q3, q.lower_fence, q.upper_fence, q.outlier_rows
    );

    // 4. Preprocess
    println!("4. Applying actions...");
    let actions = [
        Action::EliminateRedundancies {
            method: RedundancyAxis::Horizontal,
        },
        Action::HandleMissing {
            strategy: MissingStrategy::Mean,
            columns: vec!["Qair".to_string()],
        },
        Action::Outlier {
            method: OutlierMethod::Iqr,
            columns: vec!["Wind".to_string()],
        },
        Action::Discretize {
            method: BinningMethod::EqualWidth,
            num_bins: 3,
            columns: vec!["Tair".to_string()],
            label_by_average: false,
        },
        Action::Normalize {
            method: NormalizeMethod::MinMax,
            columns: vec!["PSurf".to_string()],
        },
    ];
    for action in &actions {
        let table = session.apply(action)?;
        println!("   {:<22} -> {} rows x {} columns", action.name(), table.len(), table.column_count());
    }
    println!("   history: {} snapshots\n", session.history_len());

    // 5. Rejected action leaves the session untouched
    println!("5. Applying an invalid action...");
    let bad = Action::Normalize {
        method: NormalizeMethod::ZScore,
        columns: vec!["time".to_string()],
    };
    if let Err(e) = session.apply(&bad) {
        println!("   rejected ({:?}): {}", e.kind(), e);
    }
    println!("   history: {} snapshots\n", session.history_len());

    // 6. Correlation of the climate variables
    println!("6. Correlation:");
    let corr = stats::correlation(session.current()?, &["Tair", "Qair", "Rainf"])?;
    for (name, row) in corr.columns.iter().zip(&corr.values) {
        let cells: Vec<String> = row
            .iter()
            .map(|v| v.map_or("   -".to_string(), |r| format!("{:+.2}", r)))
            .collect();
        println!("   {:<6} {}", name, cells.join("  "));
    }
    println!();

    // 7. Undo the last two actions
    println!("7. Undoing...");
    session.undo()?;
    session.undo()?;
    println!("   columns now: {:?}\n", session.current()?.column_names());

    // 8. Export
    println!("8. Export as {}:", session.export_file_name()?);
    print!("{}", session.export_csv()?);

    println!("\n=== Example Complete ===");
    Ok(())
}
