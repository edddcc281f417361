//! Basic usage example for the crd-anova library.
//!
//! This example generates each catalogue design, runs the one-way and
//! two-way ANOVA, follows up with Tukey HSD when the treatment effect is
//! significant, and finishes with the side-by-side comparison.

use crd_anova::compare::compare_catalogue;
use crd_anova::design::DesignId;
use crd_anova::report::{Sheet, Workbook};
use crd_anova::tukey::post_hoc;
use crd_anova::{analyze_one_way, analyze_two_way};

fn main() {
    println!("crd-anova - Basic Usage Example\n");

    let id = DesignId::Unbalanced;
    println!("{} ({})", id.name(), id.description());
    let data = id.generate().expect("Failed to generate design");
    println!("  Observations: {}", data.len());
    println!();

    // One-way ANOVA
    let one_way = analyze_one_way(&data).expect("One-way ANOVA failed");
    println!("Group summary:");
    for g in &one_way.groups {
        println!(
            "  {}: n = {:2}, mean = {:9.1}, sd = {:7.1}",
            g.label, g.n, g.mean, g.std_dev
        );
    }
    println!();

    println!("One-way ANOVA:");
    for entry in [&one_way.treatment, &one_way.error] {
        println!(
            "  {:<20} SS = {:14.1}  DF = {:3}  MS = {:12.1}",
            entry.source.to_string(),
            entry.sum_of_squares,
            entry.degrees_of_freedom,
            entry.mean_square
        );
    }
    println!(
        "  F = {:.4}, p = {:.6} -> {}",
        one_way.f_statistic,
        one_way.p_value,
        if one_way.significant {
            "significant"
        } else {
            "not significant"
        }
    );
    if let Some(best) = one_way.best_group() {
        println!("  Best treatment: {} ({:.1})", best.label, best.mean);
    }
    println!();

    // Tukey HSD, only when the ANOVA is significant
    let pairs = post_hoc(&data, &one_way).expect("Tukey HSD failed");
    match &pairs {
        Some(pairs) => {
            println!("Tukey HSD:");
            for p in pairs {
                println!(
                    "  {:<10} diff = {:8.1}  HSD = {:8.1}  {}",
                    p.pair(),
                    p.abs_mean_difference,
                    p.hsd_threshold,
                    if p.significant { "✓" } else { "✗" }
                );
            }
        }
        None => println!("No significant treatment effect; Tukey HSD skipped."),
    }
    println!();

    // Two-way ANOVA against positional terciles
    let two_way = analyze_two_way(&data).expect("Two-way ANOVA failed");
    println!("Two-way ANOVA:");
    for entry in two_way.effects() {
        println!(
            "  {:<10} F = {:8.4}  p = {:.6}",
            entry.source.to_string(),
            entry.f_ratio.unwrap_or(0.0),
            entry.p_value.unwrap_or(1.0)
        );
    }
    println!();

    let book = Workbook::from_analysis(&data, &one_way, Some(&two_way), pairs.as_deref());
    println!("Export sheets:");
    for sheet in &book.sheets {
        println!("  {} ({} rows)", sheet.name, sheet.rows.len());
    }
    println!();

    // Compare all six designs
    println!("Design comparison:");
    let rows = compare_catalogue();
    print!("{}", Sheet::comparison(&rows).to_csv());
}
