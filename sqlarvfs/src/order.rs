use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

use super::tree::NodeRef;

// Consume a run of ASCII digits, returning it without leading zeros and the number of zeros.
fn take_number(chars: &mut Peekable<Chars<'_>>) -> (String, usize) {
    let mut digits = String::new();
    let mut zeros = 0;

    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }

        if c == '0' && digits.is_empty() {
            zeros += 1;
        } else {
            digits.push(c);
        }

        chars.next();
    }

    (digits, zeros)
}

/// Compare two names in natural order, ignoring case.
///
/// Runs of digits are compared by their numeric value, so `file9` comes before `file10`. Names
/// that are otherwise equal are compared by their exact characters, so the order is total.
///
/// ```
/// use sqlarvfs::natural_cmp;
///
/// let mut names = vec!["foo10.txt", "bar", "foo9.txt"];
/// names.sort_by(|a, b| natural_cmp(a, b));
///
/// assert_eq!(names, ["bar", "foo9.txt", "foo10.txt"]);
/// ```
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut lhs = a.chars().peekable();
    let mut rhs = b.chars().peekable();

    // Numbers with more leading zeros sort after equal numbers with fewer.
    let mut zeros_tiebreak = Ordering::Equal;

    loop {
        let ordering = match (lhs.peek(), rhs.peek()) {
            (None, None) => break,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let (l_digits, l_zeros) = take_number(&mut lhs);
                let (r_digits, r_zeros) = take_number(&mut rhs);

                if zeros_tiebreak == Ordering::Equal {
                    zeros_tiebreak = l_zeros.cmp(&r_zeros);
                }

                l_digits
                    .len()
                    .cmp(&r_digits.len())
                    .then_with(|| l_digits.cmp(&r_digits))
            }
            (Some(&l), Some(&r)) => {
                lhs.next();
                rhs.next();

                l.to_lowercase().cmp(r.to_lowercase())
            }
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    zeros_tiebreak.then_with(|| a.cmp(b))
}

// Sort order for presenting the children of a directory.
pub(crate) fn compare_nodes(a: &NodeRef<'_>, b: &NodeRef<'_>, directories_first: bool) -> Ordering {
    let by_kind = if directories_first {
        b.is_dir().cmp(&a.is_dir())
    } else {
        Ordering::Equal
    };

    by_kind.then_with(|| natural_cmp(a.name(), b.name()))
}

#[cfg(test)]
mod tests {
    use xpct::{equal, expect};

    use super::*;

    fn sorted(names: &[&'static str]) -> Vec<&'static str> {
        let mut names = names.to_vec();
        names.sort_by(|a, b| natural_cmp(a, b));
        names
    }

    #[test]
    fn numbers_compare_by_value() {
        expect!(sorted(&["foo10.txt", "bar", "foo9.txt"]))
            .to(equal(vec!["bar", "foo9.txt", "foo10.txt"]));

        expect!(sorted(&["v1.10", "v1.2", "v1.1"])).to(equal(vec!["v1.1", "v1.2", "v1.10"]));
    }

    #[test]
    fn comparison_ignores_case() {
        expect!(sorted(&["b", "A", "c", "B"])).to(equal(vec!["A", "B", "b", "c"]));
        expect!(natural_cmp("ÄPFEL", "äpfel")).to(equal(Ordering::Less));
    }

    #[test]
    fn leading_zeros_break_ties() {
        expect!(sorted(&["file007", "file7", "file08"])).to(equal(vec![
            "file7", "file007", "file08",
        ]));
    }

    #[test]
    fn shorter_prefix_comes_first() {
        expect!(natural_cmp("file", "file1")).to(equal(Ordering::Less));
        expect!(natural_cmp("file2", "file")).to(equal(Ordering::Greater));
        expect!(natural_cmp("", "")).to(equal(Ordering::Equal));
    }

    #[test]
    fn large_numbers_do_not_overflow() {
        expect!(natural_cmp(
            "a99999999999999999999999999999",
            "a100000000000000000000000000000"
        ))
        .to(equal(Ordering::Less));
    }
}
