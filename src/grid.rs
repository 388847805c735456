//! Grid layouts.

use crate::box_layout::UNBOUNDED;
use crate::error::ConfigError;
use crate::flags::{Align, Alignment2D, LayoutFlags, Orientation};
use crate::layout::{ensure_child, ChildItem, Layout, LayoutBase};
use crate::rect::{size, Margins, Rect, Size};
use crate::tree::{ContainerLayout, ContainerView, ItemId, LayoutResultItem};
use crate::widget::{Container, Handle};
use cgmath::{Vector2, Zero};

/// The cells a widget occupies in a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridRange {
    pub column: usize,
    pub row: usize,
    pub column_span: usize,
    pub row_span: usize,
}

impl GridRange {
    pub fn new(column: usize, row: usize, column_span: usize, row_span: usize) -> GridRange {
        GridRange {
            column,
            row,
            column_span,
            row_span,
        }
    }

    /// A range covering a single cell.
    pub fn cell(column: usize, row: usize) -> GridRange {
        GridRange::new(column, row, 1, 1)
    }

    fn start(&self, orientation: Orientation) -> usize {
        match orientation {
            Orientation::Horizontal => self.column,
            Orientation::Vertical => self.row,
        }
    }

    fn span(&self, orientation: Orientation) -> usize {
        match orientation {
            Orientation::Horizontal => self.column_span,
            Orientation::Vertical => self.row_span,
        }
    }
}

/// Arranges widgets in rows and columns.
#[derive(Debug, Clone, Default)]
pub struct GridLayout {
    base: LayoutBase,
    row_stretch_factors: Vec<u32>,
    column_stretch_factors: Vec<u32>,
    /// In the order they were set; later ranges take over overlapping cells.
    ranges: Vec<(Handle, GridRange)>,
}

impl GridLayout {
    pub fn new() -> GridLayout {
        GridLayout::default()
    }

    pub fn base(&self) -> &LayoutBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut LayoutBase {
        &mut self.base
    }

    pub fn row_count(&self) -> usize {
        self.row_stretch_factors.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_stretch_factors.len()
    }

    fn ensure_sufficient_size(&mut self, rows: usize, columns: usize) {
        if self.row_stretch_factors.len() < rows {
            self.row_stretch_factors.resize(rows, 1);
        }
        if self.column_stretch_factors.len() < columns {
            self.column_stretch_factors.resize(columns, 1);
        }
    }

    pub fn row_stretch_factor(&self, row: usize) -> u32 {
        self.row_stretch_factors.get(row).copied().unwrap_or(1)
    }

    pub fn set_row_stretch_factor(&mut self, row: usize, factor: u32) -> Result<(), ConfigError> {
        if factor < 1 {
            return Err(ConfigError::InvalidStretchFactor);
        }
        let columns = self.column_count();
        self.ensure_sufficient_size(row + 1, columns);
        self.row_stretch_factors[row] = factor;
        Ok(())
    }

    pub fn column_stretch_factor(&self, column: usize) -> u32 {
        self.column_stretch_factors.get(column).copied().unwrap_or(1)
    }

    pub fn set_column_stretch_factor(
        &mut self,
        column: usize,
        factor: u32,
    ) -> Result<(), ConfigError> {
        if factor < 1 {
            return Err(ConfigError::InvalidStretchFactor);
        }
        let rows = self.row_count();
        self.ensure_sufficient_size(rows, column + 1);
        self.column_stretch_factors[column] = factor;
        Ok(())
    }

    /// Returns the cells occupied by a widget.
    pub fn range(&self, widget: Handle) -> Option<GridRange> {
        self.ranges
            .iter()
            .find(|(handle, _)| *handle == widget)
            .map(|(_, range)| *range)
    }

    /// Places a child of `container` in the given cells, growing the grid as needed.
    pub fn set_range(
        &mut self,
        container: &dyn Container,
        widget: Handle,
        range: GridRange,
    ) -> Result<(), ConfigError> {
        ensure_child(container, widget)?;
        if range.column_span < 1 || range.row_span < 1 {
            return Err(ConfigError::EmptyRange);
        }

        self.ensure_sufficient_size(range.row + range.row_span, range.column + range.column_span);
        self.ranges.retain(|(handle, _)| *handle != widget);
        self.ranges.push((widget, range));
        Ok(())
    }
}

impl Layout for GridLayout {
    fn margins(&self) -> Margins {
        self.base.margins()
    }

    fn spacing(&self) -> i32 {
        self.base.spacing()
    }

    fn alignment(&self) -> Alignment2D {
        self.base.alignment()
    }

    fn create_layout_item(&self, children: &[ChildItem]) -> Box<dyn ContainerLayout> {
        let rows = self.row_stretch_factors.len();
        let columns = self.column_stretch_factors.len();
        let mut cells = vec![vec![None; columns]; rows];
        let mut entries = Vec::new();

        for (handle, range) in &self.ranges {
            let child = match children.iter().find(|child| child.handle == *handle) {
                Some(child) => child,
                None => continue,
            };

            for row in &mut cells[range.row..range.row + range.row_span] {
                for cell in &mut row[range.column..range.column + range.column_span] {
                    *cell = Some(entries.len());
                }
            }
            entries.push(GridEntry {
                item: child.item,
                range: *range,
            });
        }

        Box::new(GridLayoutItem {
            row_stretch_factors: self.row_stretch_factors.iter().map(|f| *f as i32).collect(),
            column_stretch_factors: self
                .column_stretch_factors
                .iter()
                .map(|f| *f as i32)
                .collect(),
            cells,
            entries,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct GridEntry {
    item: ItemId,
    range: GridRange,
}

#[derive(Debug)]
struct GridLayoutItem {
    row_stretch_factors: Vec<i32>,
    column_stretch_factors: Vec<i32>,
    /// `cells[row][column]` indexes `entries`.
    cells: Vec<Vec<Option<usize>>>,
    entries: Vec<GridEntry>,
}

#[derive(Debug, Clone, Copy, Default)]
struct SectionInfo {
    index: usize,
    min: i32,
    max: i32,
    stretch: i32,
    greedy_non_spacer: bool,
    greedy_spacer: bool,
}

impl GridLayoutItem {
    fn entry_at(&self, row: usize, column: usize) -> Option<&GridEntry> {
        self.cells[row][column].map(|index| &self.entries[index])
    }

    /// Total size of the sections an entry spans, including the spacing between them.
    fn spanned(&self, entry: &GridEntry, orientation: Orientation, sizes: &[i32], spacing: i32) -> i32 {
        let start = entry.range.start(orientation);
        let end = start + entry.range.span(orientation);

        let mut total = 0;
        for (i, &size) in sizes.iter().enumerate().take(end).skip(start) {
            if size > 0 {
                total += size;
                if i > start {
                    total += spacing;
                }
            }
        }
        total
    }

    fn section_sizes_for_space(
        &self,
        container: &ContainerView<'_>,
        orientation: Orientation,
        mut space: i32,
        widths: &[i32],
    ) -> Vec<i32> {
        let tree = container.tree();
        let spacing = container.spacing();
        let stretch_factors = match orientation {
            Orientation::Horizontal => &self.column_stretch_factors,
            Orientation::Vertical => &self.row_stretch_factors,
        };
        let other_count = match orientation {
            Orientation::Horizontal => self.row_stretch_factors.len(),
            Orientation::Vertical => self.column_stretch_factors.len(),
        };

        let mut greedy_non_spacer_count = 0;
        let mut greedy_spacer_count = 0;
        let mut stretch_totals = [0; 3];
        let mut min_sizes_remaining = 0;
        let mut sections = vec![SectionInfo::default(); stretch_factors.len()];

        for (i, section) in sections.iter_mut().enumerate() {
            for j in 0..other_count {
                let entry = match orientation {
                    Orientation::Horizontal => self.entry_at(j, i),
                    Orientation::Vertical => self.entry_at(i, j),
                };
                let entry = match entry {
                    Some(entry) if tree.should_layout(entry.item) => entry,
                    _ => continue,
                };

                let id = entry.item;
                let flags = tree.layout_flags(id);
                let max = orientation.primary(tree.item(id).geometry().max_size);
                let pref = orientation.primary(tree.preferred_size(id));
                let single = entry.range.span(orientation) == 1;
                let has_hfw = orientation == Orientation::Vertical && tree.has_height_for_width(id);

                if single {
                    let min = if has_hfw {
                        tree.height_for_width(id, self.spanned(entry, Orientation::Horizontal, widths, spacing))
                    } else {
                        orientation.primary(tree.min_size_effective(id))
                    };
                    section.min = section.min.max(min);
                }

                let growable = flags.growable(orientation);
                section.max = if max > 0 {
                    section.max.max(max)
                } else if has_hfw && !growable {
                    section.min
                } else if pref > 0 && !growable {
                    section.max.max(pref)
                } else {
                    UNBOUNDED
                };

                if single && flags.greedy(orientation) {
                    if tree.is_spacer(id) {
                        section.greedy_spacer = true;
                    } else {
                        section.greedy_non_spacer = true;
                    }
                }
            }

            section.index = i;
            section.stretch = stretch_factors[i].max(1);
            min_sizes_remaining += section.min;

            let bucket = if section.greedy_non_spacer {
                greedy_non_spacer_count += 1;
                0
            } else if section.greedy_spacer {
                greedy_spacer_count += 1;
                1
            } else {
                2
            };
            stretch_totals[bucket] += section.stretch;
        }

        let mut sorted = sections.clone();
        sorted.sort_by(|a, b| {
            b.greedy_non_spacer
                .cmp(&a.greedy_non_spacer)
                .then(b.greedy_spacer.cmp(&a.greedy_spacer))
                .then(b.min.cmp(&a.min))
                .then((a.max / a.stretch).cmp(&(b.max / b.stretch)))
        });

        let margins = container.margins();
        space -= match orientation {
            Orientation::Horizontal => margins.horizontal(),
            Orientation::Vertical => margins.vertical(),
        };

        let occupied = sections.iter().filter(|section| section.max > 0).count() as i32;
        let mut spacing_remaining = spacing * (occupied - 1).max(0);

        let mut sizes = vec![0; sections.len()];
        let counts = [
            greedy_non_spacer_count,
            greedy_spacer_count,
            sections.len() - greedy_non_spacer_count - greedy_spacer_count,
        ];
        let mut offset = 0;

        for (bucket, &count) in counts.iter().enumerate() {
            let mut stretch_remaining = stretch_totals[bucket];

            for section in &sorted[offset..offset + count] {
                let mut size = section.min;
                if section.min < section.max {
                    let excess = f64::from(space - min_sizes_remaining - spacing_remaining);
                    size += (excess * f64::from(section.stretch) / f64::from(stretch_remaining)) as i32;
                    if size < section.min {
                        size = section.min;
                    } else if size > section.max {
                        size = section.max;
                    }
                }

                sizes[section.index] = size;

                min_sizes_remaining -= section.min;
                stretch_remaining -= section.stretch;
                if section.max > 0 {
                    space -= size + spacing;
                    spacing_remaining -= spacing;
                }
            }

            offset += count;
        }

        sizes
    }
}

impl ContainerLayout for GridLayoutItem {
    fn layout_flags(&self, container: &ContainerView<'_>) -> LayoutFlags {
        let tree = container.tree();
        if container.children().is_empty() {
            return LayoutFlags::SHRINKABLE_HORZ
                | LayoutFlags::SHRINKABLE_VERT
                | LayoutFlags::GROWABLE_HORZ
                | LayoutFlags::GROWABLE_VERT;
        }

        let mut flags = LayoutFlags::empty();
        for &child in container.children() {
            if tree.is_greedy_locally_only(child) || !tree.should_layout(child) {
                continue;
            }

            let mut child_flags = tree.layout_flags(child);
            let max = tree.item(child).geometry().max_size;
            if max.x > 0 {
                child_flags.remove(LayoutFlags::GREEDY_HORZ);
            }
            if max.y > 0 {
                child_flags.remove(LayoutFlags::GREEDY_VERT);
            }
            flags |= child_flags;
        }
        flags
    }

    fn min_size_for_size(&self, container: &ContainerView<'_>, space: Size) -> Size {
        if self.entries.is_empty() {
            return Vector2::zero();
        }

        let tree = container.tree();
        let spacing = container.spacing();

        let mut min_widths = vec![0; self.column_stretch_factors.len()];
        for row in 0..self.cells.len() {
            for (column, min_width) in min_widths.iter_mut().enumerate() {
                if let Some(entry) = self.entry_at(row, column) {
                    if tree.should_layout(entry.item) && entry.range.column_span == 1 {
                        *min_width = (*min_width).max(tree.min_size_effective(entry.item).x);
                    }
                }
            }
        }

        let widths = self.section_sizes_for_space(container, Orientation::Horizontal, space.x, &[]);
        let mut heights =
            self.section_sizes_for_space(container, Orientation::Vertical, space.y, &widths);

        for (row, height) in heights.iter_mut().enumerate() {
            let mut max_height = 0;
            for column in 0..widths.len() {
                let entry = match self.entry_at(row, column) {
                    Some(entry) if tree.should_layout(entry.item) && entry.range.row_span == 1 => entry,
                    _ => continue,
                };
                let item_height = if tree.has_height_for_width(entry.item) {
                    let width = self.spanned(entry, Orientation::Horizontal, &widths, spacing);
                    tree.height_for_width(entry.item, width)
                } else {
                    tree.min_size_effective(entry.item).y
                };
                max_height = max_height.max(item_height);
            }
            *height = max_height;
        }

        let total = |sizes: &[i32]| {
            let occupied: Vec<_> = sizes.iter().filter(|size| **size > 0).collect();
            occupied.iter().copied().sum::<i32>() + spacing * (occupied.len() as i32 - 1).max(0)
        };

        container.margins().size() + size(total(&min_widths), total(&heights))
    }

    fn perform_layout(
        &self,
        container: &ContainerView<'_>,
        client_size: Size,
    ) -> Vec<LayoutResultItem> {
        let tree = container.tree();
        let margins = container.margins();
        let spacing = container.spacing();

        let widths =
            self.section_sizes_for_space(container, Orientation::Horizontal, client_size.x, &[]);
        let heights =
            self.section_sizes_for_space(container, Orientation::Vertical, client_size.y, &widths);

        let offset = |sizes: &[i32], start: usize| -> i32 {
            sizes[..start]
                .iter()
                .filter(|size| **size > 0)
                .map(|size| size + spacing)
                .sum()
        };

        let mut results = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let id = entry.item;
            if !tree.should_layout(id) {
                continue;
            }

            let mut x = margins.h_near + offset(&widths, entry.range.column);
            let mut y = margins.v_near + offset(&heights, entry.range.row);
            let width = self.spanned(entry, Orientation::Horizontal, &widths, spacing);
            let height = self.spanned(entry, Orientation::Vertical, &heights, spacing);

            let mut w = width;
            let mut h = height;

            let flags = tree.layout_flags(id);
            let growable_horz = flags.contains(LayoutFlags::GROWABLE_HORZ);
            let growable_vert = flags.contains(LayoutFlags::GROWABLE_VERT);
            if !growable_horz || !growable_vert {
                let mut pref = tree.preferred_size(id);
                let max = tree.item(id).geometry().max_size;

                if max.x > 0 && pref.x > max.x {
                    pref.x = max.x;
                }
                if !growable_horz {
                    w = pref.x;
                }
                w = w.min(width);

                if tree.has_height_for_width(id) {
                    h = tree.height_for_width(id, w);
                } else {
                    if max.y > 0 && pref.y > max.y {
                        pref.y = max.y;
                    }
                    if !growable_vert {
                        h = pref.y;
                    }
                }
                h = h.min(height);
            }

            let (horizontal, vertical) = match tree.item(id).geometry().alignment.or(container.alignment()) {
                Alignment2D::Default => (Align::Near, Align::Near),
                Alignment2D::Aligned {
                    horizontal,
                    vertical,
                } => (horizontal, vertical),
            };

            x += match horizontal {
                Align::Near => 0,
                Align::Center => (width - w) / 2,
                Align::Far => width - w,
            };
            y += match vertical {
                Align::Near => 0,
                Align::Center => (height - h) / 2,
                Align::Far => height - h,
            };

            results.push(LayoutResultItem {
                item: id,
                handle: tree.handle(id),
                bounds: Rect::new(x, y, w, h),
            });
        }

        results
    }
}
