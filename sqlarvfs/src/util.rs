// This conversion should always succeed.
pub fn u64_from_usize(num: usize) -> u64 {
    u64::try_from(num).expect("Failed converting a usize into a u64.")
}

// SQLite integers are signed and nullable. Sizes that are negative or missing count as zero.
pub fn size_from_sql(num: Option<i64>) -> u64 {
    num.and_then(|num| u64::try_from(num).ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use xpct::{equal, expect};

    #[test]
    fn convert_int() {
        expect!(u64_from_usize(42)).to(equal(42));
    }

    #[test]
    fn sizes_from_sql_are_never_negative() {
        expect!(size_from_sql(Some(42))).to(equal(42));
        expect!(size_from_sql(Some(-1))).to(equal(0));
        expect!(size_from_sql(None)).to(equal(0));
    }
}
