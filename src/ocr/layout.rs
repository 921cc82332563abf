use super::{OcrLine, OcrWord};

/// Boxes whose top edges are at most this far apart (pixels) belong to the same line.
pub const LINE_GROUP_THRESHOLD: f64 = 20.0;

/// Group detected word boxes into reading-order lines.
///
/// Boxes are taken top to bottom; each joins the first line whose first box is within
/// [`LINE_GROUP_THRESHOLD`] vertically, otherwise it starts a new line. Words in a line are
/// then ordered left to right. Blank words are dropped.
pub fn group_into_lines(mut words: Vec<OcrWord>) -> Vec<OcrLine> {
    words.retain(|w| !w.text.trim().is_empty());
    words.sort_by(|a, b| a.bounding_rect.y.total_cmp(&b.bounding_rect.y));

    let mut grouped: Vec<Vec<OcrWord>> = Vec::new();
    for word in words {
        let slot = grouped.iter_mut().find(|line| {
            line.first().is_some_and(|first| {
                (word.bounding_rect.y - first.bounding_rect.y).abs() <= LINE_GROUP_THRESHOLD
            })
        });
        match slot {
            Some(line) => line.push(word),
            None => grouped.push(vec![word]),
        }
    }

    let mut lines: Vec<OcrLine> = grouped
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.bounding_rect.x.total_cmp(&b.bounding_rect.x));
            OcrLine::from_words(line)
        })
        .collect();
    lines.sort_by(|a, b| line_top(a).total_cmp(&line_top(b)));
    lines
}

fn line_top(line: &OcrLine) -> f64 {
    line.words
        .iter()
        .map(|w| w.bounding_rect.y)
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::BoundingBox;

    fn word(text: &str, x: f64, y: f64) -> OcrWord {
        OcrWord::new(text, BoundingBox::new(x, y, 30.0, 15.0))
    }

    #[test]
    fn groups_by_row_and_orders_by_column() {
        let lines = group_into_lines(vec![
            word("world", 60.0, 12.0),
            word("second", 0.0, 50.0),
            word("hello", 0.0, 10.0),
            word("  ", 100.0, 10.0),
        ]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "hello world");
        assert_eq!(lines[1].text, "second");
    }

    #[test]
    fn threshold_is_inclusive() {
        let lines = group_into_lines(vec![word("a", 0.0, 0.0), word("b", 40.0, 20.0)]);
        assert_eq!(lines.len(), 1);
        let lines = group_into_lines(vec![word("a", 0.0, 0.0), word("b", 40.0, 20.5)]);
        assert_eq!(lines.len(), 2);
    }
}
