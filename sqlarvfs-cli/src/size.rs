use clap::ValueEnum;

const KB: f64 = 1000.0;
const MB: f64 = 1000.0 * KB;
const GB: f64 = 1000.0 * MB;
const TB: f64 = 1000.0 * GB;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * KIB;
const GIB: f64 = 1024.0 * MIB;
const TIB: f64 = 1024.0 * GIB;

/// How to print file sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SizeFormat {
    /// The exact number of bytes.
    Bytes,

    /// Binary units (KiB, MiB, GiB, TiB).
    #[default]
    Binary,

    /// SI units (KB, MB, GB, TB).
    Si,
}

// Three significant figures below 100, and whole numbers otherwise.
fn round(num: f64) -> String {
    if num >= 100.0 {
        return format!("{:.0}", num);
    }

    let decimals = if num >= 10.0 {
        1
    } else if num >= 1.0 {
        2
    } else {
        3
    };

    let formatted = format!("{:.*}", decimals, num);

    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_owned()
}

pub fn format_size(bytes: u64, format: SizeFormat) -> String {
    let size = bytes as f64;

    // A value is promoted to the next unit once it would round up to 1024 (or 1000) of the
    // current one.
    match format {
        SizeFormat::Bytes => bytes.to_string(),
        SizeFormat::Binary if size >= 1023.5 * GIB => format!("{} TiB", round(size / TIB)),
        SizeFormat::Binary if size >= 1023.5 * MIB => format!("{} GiB", round(size / GIB)),
        SizeFormat::Binary if size >= 1023.5 * KIB => format!("{} MiB", round(size / MIB)),
        SizeFormat::Binary if size >= KIB => format!("{} KiB", round(size / KIB)),
        SizeFormat::Si if size >= 999.5 * GB => format!("{} TB", round(size / TB)),
        SizeFormat::Si if size >= 999.5 * MB => format!("{} GB", round(size / GB)),
        SizeFormat::Si if size >= 999.5 * KB => format!("{} MB", round(size / MB)),
        SizeFormat::Si if size >= KB => format!("{} KB", round(size / KB)),
        SizeFormat::Binary | SizeFormat::Si => format!("{} B", bytes),
    }
}
