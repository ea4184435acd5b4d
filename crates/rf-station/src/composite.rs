//! `Macro` — a named container for a sub-network.
//!
//! A macro owns handles to its parts and steps the steppable ones in the
//! order they were added.  Receivers and providers are only recorded so the
//! host can find the sub-network's entry and exit points.

use std::cell::RefCell;
use std::rc::Rc;

use rf_core::{FlowContext, FlowError, FlowResult};
use rf_flow::{Named, ProviderRef, ReceiverRef, Steppable, SteppableRef};

fn insert_once<T: ?Sized>(list: &mut Vec<Rc<RefCell<T>>>, item: Rc<RefCell<T>>) -> bool {
    if list.iter().any(|x| Rc::ptr_eq(x, &item)) {
        return false;
    }
    list.push(item);
    true
}

pub struct Macro {
    name:       String,
    steppables: Vec<SteppableRef>,
    receivers:  Vec<ReceiverRef>,
    providers:  Vec<ProviderRef>,
}

impl Macro {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:       name.into(),
            steppables: Vec::new(),
            receivers:  Vec::new(),
            providers:  Vec::new(),
        }
    }

    /// Returns `false` if `part` was already added.
    pub fn add_steppable(&mut self, part: SteppableRef) -> bool {
        insert_once(&mut self.steppables, part)
    }

    pub fn add_receiver(&mut self, part: ReceiverRef) -> bool {
        insert_once(&mut self.receivers, part)
    }

    pub fn add_provider(&mut self, part: ProviderRef) -> bool {
        insert_once(&mut self.providers, part)
    }

    pub fn steppables(&self) -> &[SteppableRef] {
        &self.steppables
    }

    pub fn receivers(&self) -> &[ReceiverRef] {
        &self.receivers
    }

    pub fn providers(&self) -> &[ProviderRef] {
        &self.providers
    }
}

impl Named for Macro {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Steppable for Macro {
    fn step(&mut self, ctx: &mut FlowContext) -> FlowResult<()> {
        for part in &self.steppables {
            part.try_borrow_mut()
                .map_err(|_| FlowError::CyclicOffer {
                    provider: self.name.clone(),
                })?
                .step(ctx)?;
        }
        Ok(())
    }
}
