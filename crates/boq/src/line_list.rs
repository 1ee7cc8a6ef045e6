use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boqkit_catalog::Item;
use boqkit_core::{
    Aggregate, AggregateRoot, CollectionId, DomainError, DomainResult, ItemId, position_of,
};
use boqkit_events::Event;

use crate::line::Line;
use crate::total::compute_total;

/// Aggregate root: the bill of quantities.
///
/// Ordered lines keyed by `item_id`; adding an item already present bumps its
/// quantity instead of adding a second line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineList {
    lines: Vec<Line>,
    version: u64,
}

impl LineList {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from persisted lines. Repeated item ids are rejected.
    pub fn new(lines: Vec<Line>) -> DomainResult<Self> {
        for (idx, line) in lines.iter().enumerate() {
            if position_of(&lines[..idx], &line.item_id).is_some() {
                return Err(DomainError::conflict(format!(
                    "duplicate line for item '{}'",
                    line.item_id
                )));
            }
        }
        Ok(Self { lines, version: 0 })
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn get(&self, item_id: &ItemId) -> Option<&Line> {
        position_of(&self.lines, item_id).map(|idx| &self.lines[idx])
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total(&self) -> f64 {
        compute_total(&self.lines)
    }
}

impl AggregateRoot for LineList {
    type Id = CollectionId;

    fn id(&self) -> &Self::Id {
        &CollectionId::Boq
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AddLine (snapshot of the item being added).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddLine {
    pub item_id: ItemId,
    pub name: String,
    pub unit_price: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetQuantity.
///
/// `quantity` is the raw numeric input; the reducer clamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetQuantity {
    pub item_id: ItemId,
    pub quantity: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveLine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveLine {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ClearLines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearLines {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LineListCommand {
    AddLine(AddLine),
    SetQuantity(SetQuantity),
    RemoveLine(RemoveLine),
    ClearLines(ClearLines),
}

impl LineListCommand {
    /// Snapshot `item` now and add it.
    pub fn add(item: &Item) -> Self {
        Self::AddLine(AddLine {
            item_id: item.id.clone(),
            name: item.name.clone(),
            unit_price: item.price,
            occurred_at: Utc::now(),
        })
    }

    pub fn set_quantity(item_id: ItemId, quantity: f64) -> Self {
        Self::SetQuantity(SetQuantity {
            item_id,
            quantity,
            occurred_at: Utc::now(),
        })
    }

    pub fn remove(item_id: ItemId) -> Self {
        Self::RemoveLine(RemoveLine {
            item_id,
            occurred_at: Utc::now(),
        })
    }

    pub fn clear() -> Self {
        Self::ClearLines(ClearLines {
            occurred_at: Utc::now(),
        })
    }
}

/// Event: LineAdded (new line at quantity 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineAdded {
    pub item_id: ItemId,
    pub name: String,
    pub unit_price: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuantityIncremented (existing line added again).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityIncremented {
    pub item_id: ItemId,
    pub quantity: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuantitySet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitySet {
    pub item_id: ItemId,
    pub quantity: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineRemoved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRemoved {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LinesCleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinesCleared {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LineListEvent {
    LineAdded(LineAdded),
    QuantityIncremented(QuantityIncremented),
    QuantitySet(QuantitySet),
    LineRemoved(LineRemoved),
    LinesCleared(LinesCleared),
}

impl Event for LineListEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LineListEvent::LineAdded(_) => "boq.line.added",
            LineListEvent::QuantityIncremented(_) => "boq.line.incremented",
            LineListEvent::QuantitySet(_) => "boq.line.quantity_set",
            LineListEvent::LineRemoved(_) => "boq.line.removed",
            LineListEvent::LinesCleared(_) => "boq.cleared",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LineListEvent::LineAdded(e) => e.occurred_at,
            LineListEvent::QuantityIncremented(e) => e.occurred_at,
            LineListEvent::QuantitySet(e) => e.occurred_at,
            LineListEvent::LineRemoved(e) => e.occurred_at,
            LineListEvent::LinesCleared(e) => e.occurred_at,
        }
    }
}

impl Aggregate for LineList {
    type Command = LineListCommand;
    type Event = LineListEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LineListEvent::LineAdded(e) => {
                self.lines.push(Line {
                    item_id: e.item_id.clone(),
                    name: e.name.clone(),
                    unit_price: e.unit_price,
                    quantity: 1,
                });
            }
            LineListEvent::QuantityIncremented(QuantityIncremented {
                item_id, quantity, ..
            })
            | LineListEvent::QuantitySet(QuantitySet {
                item_id, quantity, ..
            }) => {
                if let Some(idx) = position_of(&self.lines, item_id) {
                    self.lines[idx].quantity = *quantity;
                }
            }
            LineListEvent::LineRemoved(e) => {
                self.lines.retain(|line| line.item_id != e.item_id);
            }
            LineListEvent::LinesCleared(_) => {
                self.lines.clear();
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LineListCommand::AddLine(cmd) => self.handle_add(cmd),
            LineListCommand::SetQuantity(cmd) => self.handle_set_quantity(cmd),
            LineListCommand::RemoveLine(cmd) => self.handle_remove(cmd),
            LineListCommand::ClearLines(cmd) => self.handle_clear(cmd),
        }
    }
}

impl LineList {
    fn handle_add(&self, cmd: &AddLine) -> Result<Vec<LineListEvent>, DomainError> {
        if let Some(existing) = self.get(&cmd.item_id) {
            return Ok(vec![LineListEvent::QuantityIncremented(QuantityIncremented {
                item_id: cmd.item_id.clone(),
                quantity: existing.quantity.saturating_add(1),
                occurred_at: cmd.occurred_at,
            })]);
        }

        if !cmd.unit_price.is_finite() || cmd.unit_price < 0.0 {
            return Err(DomainError::validation("unit price must be a non-negative number"));
        }

        Ok(vec![LineListEvent::LineAdded(LineAdded {
            item_id: cmd.item_id.clone(),
            name: cmd.name.clone(),
            unit_price: cmd.unit_price,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_quantity(&self, cmd: &SetQuantity) -> Result<Vec<LineListEvent>, DomainError> {
        if !cmd.quantity.is_finite() {
            return Err(DomainError::validation("quantity must be a number"));
        }

        if self.get(&cmd.item_id).is_none() {
            return Ok(vec![]);
        }

        // Negative input clamps to zero; fractions truncate. `as` saturates at u64::MAX.
        let quantity = cmd.quantity.max(0.0).trunc() as u64;

        Ok(vec![LineListEvent::QuantitySet(QuantitySet {
            item_id: cmd.item_id.clone(),
            quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove(&self, cmd: &RemoveLine) -> Result<Vec<LineListEvent>, DomainError> {
        if self.get(&cmd.item_id).is_none() {
            return Ok(vec![]);
        }

        Ok(vec![LineListEvent::LineRemoved(LineRemoved {
            item_id: cmd.item_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_clear(&self, cmd: &ClearLines) -> Result<Vec<LineListEvent>, DomainError> {
        if self.lines.is_empty() {
            return Ok(vec![]);
        }

        Ok(vec![LineListEvent::LinesCleared(LinesCleared {
            occurred_at: cmd.occurred_at,
        })])
    }
}
