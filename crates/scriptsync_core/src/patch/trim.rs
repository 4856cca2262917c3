//! Shrinking a change set by its identical boundary units.

use super::changed::ChangeSet;

/// How many units each pass took off a [`ChangeSet`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrimStats {
    pub leading: usize,
    pub trailing: usize,
}

impl ChangeSet {
    /// Trim units that are identical on both sides.
    ///
    /// Leading matches are blanked rather than removed: the last one stays
    /// as an empty anchor whose host block receives the replacement, and the
    /// region starts right after its text. Trailing matches are removed.
    /// The first unit of either side is never removed and the last unit is
    /// never blanked.
    pub fn trim(&mut self) -> TrimStats {
        let mut stats = TrimStats::default();

        let mut anchored = false;
        loop {
            let next = usize::from(anchored);
            let matches = next + 1 < self.before.len()
                && next + 1 < self.after.len()
                && self.before[next].raw == self.after[next].raw;
            if !matches {
                break;
            }
            if anchored {
                self.before.remove(0);
                self.after.remove(0);
                self.plain_position += 1;
                self.plain_length -= 1;
            }
            let text_len = self.before[0].text_len();
            self.before[0].blank();
            self.after[0].blank();
            self.plain_position += text_len;
            self.plain_length -= text_len;
            anchored = true;
            stats.leading += 1;
        }

        while self.before.len() > 1
            && self.after.len() > 1
            && self.before.last().map(|unit| &unit.raw) == self.after.last().map(|unit| &unit.raw)
        {
            let Some(unit) = self.before.pop() else {
                break;
            };
            self.after.pop();
            self.plain_length -= unit.text_len() + 1;
            stats.trailing += 1;
        }

        stats
    }
}
