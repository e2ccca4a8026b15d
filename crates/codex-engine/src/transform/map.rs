/// Which side a mapped position sticks to when content is inserted at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// The content on the `assoc` side of the position was deleted.
    pub deleted: bool,
}

/// The position changes made by a single step: a list of
/// `(start, old_size, new_size)` ranges in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<(usize, usize, usize)>,
    inverted: bool,
}

impl StepMap {
    pub fn new(start: usize, old_size: usize, new_size: usize) -> Self {
        if old_size == 0 && new_size == 0 {
            return Self::empty();
        }
        Self {
            ranges: vec![(start, old_size, new_size)],
            inverted: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn invert(&self) -> StepMap {
        StepMap {
            ranges: self.ranges.clone(),
            inverted: !self.inverted,
        }
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut diff: isize = 0;
        for &(range_start, old, new) in &self.ranges {
            let (old_size, new_size) = if self.inverted { (new, old) } else { (old, new) };
            let start = if self.inverted {
                (range_start as isize - diff) as usize
            } else {
                range_start
            };
            if start > pos {
                break;
            }
            let end = start + old_size;
            if pos <= end {
                let left = if old_size == 0 {
                    assoc == Assoc::Left
                } else if pos == start {
                    true
                } else if pos == end {
                    false
                } else {
                    assoc == Assoc::Left
                };
                let mapped = (start as isize + diff) as usize + if left { 0 } else { new_size };
                let deleted = match assoc {
                    Assoc::Left => pos != start,
                    Assoc::Right => pos != end,
                };
                return MapResult {
                    pos: mapped,
                    deleted,
                };
            }
            diff += new_size as isize - old_size as isize;
        }
        MapResult {
            pos: (pos as isize + diff) as usize,
            deleted: false,
        }
    }

    /// Visit every changed range as `(old_start, old_end, new_start, new_end)`.
    pub fn for_each(&self, mut f: impl FnMut(usize, usize, usize, usize)) {
        let mut diff: isize = 0;
        for &(start, old, new) in &self.ranges {
            let (old_size, new_size) = if self.inverted { (new, old) } else { (old, new) };
            let old_start = if self.inverted {
                (start as isize - diff) as usize
            } else {
                start
            };
            let new_start = (old_start as isize + diff) as usize;
            f(old_start, old_start + old_size, new_start, new_start + new_size);
            diff += new_size as isize - old_size as isize;
        }
    }
}

/// A pipeline of step maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_maps(maps: Vec<StepMap>) -> Self {
        Self { maps }
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    /// Append all of another mapping's maps.
    pub fn append(&mut self, other: &Mapping) {
        self.maps.extend(other.maps.iter().cloned());
    }

    /// The maps from `from` onwards.
    pub fn slice(&self, from: usize) -> Mapping {
        Mapping {
            maps: self.maps[from.min(self.maps.len())..].to_vec(),
        }
    }

    pub fn invert(&self) -> Mapping {
        Mapping {
            maps: self.maps.iter().rev().map(StepMap::invert).collect(),
        }
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.maps.iter().fold(pos, |pos, map| map.map(pos, assoc))
    }

    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut deleted = false;
        let mut pos = pos;
        for map in &self.maps {
            let result = map.map_result(pos, assoc);
            deleted |= result.deleted;
            pos = result.pos;
        }
        MapResult { pos, deleted }
    }

    /// Map a position, or `None` if the content around it was deleted.
    pub fn map_opt(&self, pos: usize) -> Option<usize> {
        let result = self.map_result(pos, Assoc::Right);
        (!result.deleted).then_some(result.pos)
    }
}
