use console::Style;
use delaymap_core::pipeline::config::PipelineConfig;
use delaymap_core::pipeline::PipelineOutput;

struct Styles {
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    warning: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            warning: Style::new().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_pipeline_summary(config: &PipelineConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Delay Map"));
    println!("  {}", s.header.apply_to("\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}"));
    println!();

    for input in &config.inputs {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Input"),
            s.path.apply_to(input.display())
        );
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output_dir.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Frame rate"),
        s.value.apply_to(format!("{} fps", config.frame_rate))
    );
    println!();

    println!("  {}", s.header.apply_to("Lag Search"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Max delay"),
        s.value.apply_to(format!("{} frames", config.correlation.max_delay))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Window"),
        s.method.apply_to(config.correlation.lag_window)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Flat pixels"),
        s.method.apply_to(config.correlation.degenerate_pixels)
    );
    println!();

    println!("  {}", s.header.apply_to("Registration"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Rounding"),
        s.method.apply_to(config.registration.rounding)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Subpixel"),
        s.value.apply_to(if config.registration.subpixel { "yes" } else { "no" })
    );
    println!();
}

pub fn print_run_result(output: &PipelineOutput) {
    let s = Styles::new();
    let result = &output.result;

    println!();
    println!("  {}", s.header.apply_to("Segments"));
    for (index, segment) in result.segments.iter().enumerate() {
        let degenerate = if segment.degenerate_pixels > 0 {
            s.warning
                .apply_to(format!("{} flat px", segment.degenerate_pixels))
                .to_string()
        } else {
            String::new()
        };
        println!(
            "    {:>3}. {:<28}{:>5} frames  shift ({:+.2}, {:+.2})  {}",
            s.label.apply_to(index + 1),
            s.value.apply_to(&segment.label),
            segment.frames,
            segment.shift.row,
            segment.shift.col,
            degenerate
        );
    }
    println!();

    let (h, w) = result.delay_map.shape();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Map size"),
        s.value.apply_to(format!("{w}x{h}"))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Delay map"),
        s.path.apply_to(output.files.delay_map.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Preview"),
        s.path.apply_to(output.files.delay_preview.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Reference"),
        s.path.apply_to(output.files.reference_preview.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Summary"),
        s.path.apply_to(output.files.summary.display())
    );
    println!();
}
