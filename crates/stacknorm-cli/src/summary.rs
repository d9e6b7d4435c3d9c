use console::Style;
use stacknorm_core::pipeline::config::RunConfig;
use stacknorm_core::pipeline::RunSummary;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    ok: Style,
    failed: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            ok: Style::new().green(),
            failed: Style::new().red().bold(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn on_off(s: &Styles, enabled: bool) -> String {
    if enabled {
        s.ok.apply_to("on").to_string()
    } else {
        s.disabled.apply_to("off").to_string()
    }
}

pub fn print_run_settings(config: &RunConfig) {
    let s = Styles::new();
    let policy = &config.policy;

    println!();
    println!("  {}", s.title.apply_to("Stack Normalization"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(19)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input_dir.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output_dir.display())
    );
    println!();

    println!("  {}", s.header.apply_to("Policy"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Normalize"),
        on_off(&s, policy.normalize_enabled)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("CLAHE"),
        on_off(&s, policy.enhance_enabled)
    );
    if policy.enhance_enabled {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Skip"),
            s.value.apply_to(&policy.saturated_channel_id)
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("Clip"),
            s.value.apply_to(policy.clahe.clip_limit)
        );
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Depth"),
        s.value.apply_to(policy.output_bit_depth)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Preview"),
        on_off(&s, config.show_preview)
    );
    println!();

    println!("  {}", s.header.apply_to("Colours"));
    for (channel, color) in &policy.channel_color_map {
        println!(
            "    {:<16}{}",
            s.label.apply_to(channel),
            s.value.apply_to(color)
        );
    }
    println!();
}

pub fn print_run_summary(summary: &RunSummary) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Summary"));
    println!(
        "    {:<12}{} of {}",
        s.label.apply_to("Groups"),
        s.ok.apply_to(summary.groups_succeeded),
        s.value.apply_to(summary.groups_total)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Channels"),
        s.ok.apply_to(summary.channels_succeeded)
    );
    if summary.channels_failed > 0 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Failed"),
            s.failed.apply_to(summary.channels_failed)
        );
    }
    if summary.preview_failures > 0 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Previews"),
            s.failed.apply_to(format!("{} failed", summary.preview_failures))
        );
    }
    println!();

    if !summary.failures.is_empty() {
        println!("  {}", s.header.apply_to("Skipped channels"));
        for failure in &summary.failures {
            println!(
                "    {} {} [{}]",
                s.failed.apply_to(&failure.channel_id),
                s.path.apply_to(&failure.file_name),
                s.label.apply_to(failure.kind)
            );
            println!("      {}", s.label.apply_to(&failure.message));
        }
        println!();
    }

    if !summary.ambiguities.is_empty() {
        println!("  {}", s.header.apply_to("Ambiguous names"));
        for ambiguity in &summary.ambiguities {
            println!("    {}", s.disabled.apply_to(ambiguity));
        }
        println!();
    }
}
