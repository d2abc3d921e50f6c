//! Merge stage: unify classes across inputs.
//!
//! Local definitions are placed first so that a foreign class in one input
//! binds to its definition in another. A class defined by two inputs is an
//! error unless it is configured as partial.

use bytelink_core::demangle_type;
use tracing::debug;

use super::{Context, InputMap, Stage};
use crate::error::LinkError;

impl Context {
    pub fn merge(&mut self) -> bool {
        self.run_stage(Stage::Merge, Self::merge_classes)
    }

    fn merge_classes(&mut self) {
        let Self {
            config,
            container,
            inputs,
            maps,
            definers,
            errors,
            ..
        } = self;
        maps.clear();
        maps.resize_with(inputs.len(), InputMap::default);

        for (index, file) in inputs.iter().enumerate() {
            for id in file.class_ids().filter(|&id| !file.is_foreign(id)) {
                let name = match file.string_at(id) {
                    Ok(name) => name,
                    Err(e) => {
                        errors.push(LinkError::malformed(file.name(), e));
                        continue;
                    }
                };
                match definers.get(name).copied() {
                    Some(first) if !config.is_partial(name) => {
                        errors.push(LinkError::ClassRedefinition {
                            class: demangle_type(name),
                            first: inputs[first].name().to_string(),
                            second: file.name().to_string(),
                        });
                        continue;
                    }
                    Some(_) => debug!(class = name, input = file.name(), "partial class extended"),
                    None => {
                        definers.insert(name.to_string(), index);
                    }
                }
                let item = container.get_or_create_class(name);
                maps[index].classes.insert(id, item);
            }
        }

        for (index, file) in inputs.iter().enumerate() {
            for id in file.class_ids().filter(|&id| file.is_foreign(id)) {
                let name = match file.string_at(id) {
                    Ok(name) => name,
                    Err(e) => {
                        errors.push(LinkError::malformed(file.name(), e));
                        continue;
                    }
                };
                let item = match container.find_class(name) {
                    Some(item) => item,
                    None => container.get_or_create_foreign_class(name),
                };
                maps[index].classes.insert(id, item);
            }
        }

        debug!(
            classes = definers.len(),
            total = container.classes().count(),
            "classes merged"
        );
    }
}
