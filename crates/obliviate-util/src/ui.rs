use indicatif::{ProgressBar, ProgressStyle};

/// Single progress bar, ticking once per processed item.
pub fn single_pb(length: u64) -> ProgressBar {
    let pb = ProgressBar::new(length);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [ {bar:50} ] {pos}/{len} {msg} {spinner}")
            .expect("valid progress bar template")
            .progress_chars("#|-"),
    );
    pb
}
