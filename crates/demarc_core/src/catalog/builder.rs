//! Catalog assembly and override-table construction.

use super::{Catalog, Operation, TypeInfo, TypeKind, Visibility};
use crate::error::ConfigError;
use crate::types::{OperationId, TypeKey};
use std::collections::{HashMap, HashSet, VecDeque};

/// Builder for a [`Catalog`].
///
/// # Example
///
/// ```rust
/// use demarc_core::{Catalog, TypeKind};
///
/// let mut builder = Catalog::builder();
/// let service = builder.declare_type("OrderService", TypeKind::Interface).unwrap();
/// let imp = builder.declare_type("OrderServiceImpl", TypeKind::Concrete).unwrap();
/// builder.extend(imp, service).unwrap();
/// let place = builder.declare_operation(service, "place", &["Order"]).unwrap();
/// let place_impl = builder.declare_operation(imp, "place", &["Order"]).unwrap();
/// let catalog = builder.build().unwrap();
///
/// assert_eq!(catalog.most_specific(place, Some(imp)), place_impl);
/// ```
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    types: Vec<TypeInfo>,
    operations: Vec<Operation>,
    by_name: HashMap<String, TypeKey>,
}

impl CatalogBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a type.
    pub fn declare_type(
        &mut self,
        name: impl Into<String>,
        kind: TypeKind,
    ) -> Result<TypeKey, ConfigError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(ConfigError::DuplicateType { name });
        }
        let key = TypeKey::new(self.types.len() as u32);
        self.by_name.insert(name.clone(), key);
        self.types.push(TypeInfo {
            key,
            name,
            kind,
            supertypes: Vec::new(),
            operations: Vec::new(),
        });
        Ok(key)
    }

    /// Records that `sub` extends or implements `sup`.
    pub fn extend(&mut self, sub: TypeKey, sup: TypeKey) -> Result<(), ConfigError> {
        self.check_type(sup)?;
        let name = self.type_name(sub)?.to_string();
        if sub == sup {
            return Err(ConfigError::InheritanceCycle { type_name: name });
        }
        let supertypes = &mut self.types[sub.index()].supertypes;
        if !supertypes.contains(&sup) {
            supertypes.push(sup);
        }
        Ok(())
    }

    /// Declares a public operation on `ty`.
    pub fn declare_operation(
        &mut self,
        ty: TypeKey,
        name: impl Into<String>,
        params: &[&str],
    ) -> Result<OperationId, ConfigError> {
        self.declare(ty, name.into(), params, Visibility::Public)
    }

    /// Declares a restricted (non-public) operation on `ty`.
    pub fn declare_restricted_operation(
        &mut self,
        ty: TypeKey,
        name: impl Into<String>,
        params: &[&str],
    ) -> Result<OperationId, ConfigError> {
        self.declare(ty, name.into(), params, Visibility::Restricted)
    }

    fn declare(
        &mut self,
        ty: TypeKey,
        name: String,
        params: &[&str],
        visibility: Visibility,
    ) -> Result<OperationId, ConfigError> {
        self.check_type(ty)?;
        let op = Operation {
            id: OperationId::new(self.operations.len() as u32),
            name,
            params: params.iter().map(|p| (*p).to_string()).collect(),
            declaring_type: ty,
            visibility,
        };
        let info = &self.types[ty.index()];
        if info
            .operations
            .iter()
            .any(|&existing| self.operations[existing.index()].same_signature(&op))
        {
            return Err(ConfigError::DuplicateOperation {
                type_name: info.name.clone(),
                signature: op.signature(),
            });
        }
        let id = op.id;
        self.types[ty.index()].operations.push(id);
        self.operations.push(op);
        Ok(id)
    }

    /// Validates the type graph and computes override tables.
    pub fn build(self) -> Result<Catalog, ConfigError> {
        self.check_acyclic()?;

        let mut overrides = HashMap::new();
        for info in &self.types {
            self.resolve_overrides(info, &mut overrides)?;
        }

        Ok(Catalog {
            types: self.types,
            operations: self.operations,
            by_name: self.by_name,
            overrides,
        })
    }

    fn check_type(&self, ty: TypeKey) -> Result<(), ConfigError> {
        self.type_name(ty).map(|_| ())
    }

    fn type_name(&self, ty: TypeKey) -> Result<&str, ConfigError> {
        self.types
            .get(ty.index())
            .map(|info| info.name.as_str())
            .ok_or(ConfigError::UnknownType(ty))
    }

    fn check_acyclic(&self) -> Result<(), ConfigError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        fn visit(
            builder: &CatalogBuilder,
            ty: TypeKey,
            marks: &mut [Mark],
        ) -> Result<(), ConfigError> {
            match marks[ty.index()] {
                Mark::Done => return Ok(()),
                Mark::InProgress => {
                    return Err(ConfigError::InheritanceCycle {
                        type_name: builder.types[ty.index()].name.clone(),
                    })
                }
                Mark::Unvisited => {}
            }
            marks[ty.index()] = Mark::InProgress;
            for &sup in &builder.types[ty.index()].supertypes {
                visit(builder, sup, marks)?;
            }
            marks[ty.index()] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.types.len()];
        for info in &self.types {
            visit(self, info.key, &mut marks)?;
        }
        Ok(())
    }

    /// Breadth-first walk from `ty`, yielding each reachable type once with
    /// its distance.
    fn lineage(&self, ty: TypeKey) -> Vec<(TypeKey, usize)> {
        let mut seen = HashSet::from([ty]);
        let mut queue = VecDeque::from([(ty, 0)]);
        let mut out = Vec::new();
        while let Some((current, distance)) = queue.pop_front() {
            out.push((current, distance));
            for &sup in &self.types[current.index()].supertypes {
                if seen.insert(sup) {
                    queue.push_back((sup, distance + 1));
                }
            }
        }
        out
    }

    fn resolve_overrides(
        &self,
        info: &TypeInfo,
        overrides: &mut HashMap<(TypeKey, OperationId), OperationId>,
    ) -> Result<(), ConfigError> {
        struct Candidate {
            op: OperationId,
            distance: usize,
            from_interface: bool,
        }

        // Declarations grouped by signature, in lineage order.
        let mut by_signature: HashMap<(&str, &[String]), Vec<Candidate>> = HashMap::new();
        for (ty, distance) in self.lineage(info.key) {
            let from_interface = self.types[ty.index()].kind.is_interface();
            for &op in &self.types[ty.index()].operations {
                let decl = &self.operations[op.index()];
                by_signature
                    .entry((decl.name.as_str(), decl.params.as_slice()))
                    .or_default()
                    .push(Candidate {
                        op,
                        distance,
                        from_interface,
                    });
            }
        }

        for candidates in by_signature.values() {
            if candidates.len() < 2 {
                continue;
            }
            // Implementations on classes beat declarations on interfaces.
            let tier: Vec<&Candidate> = if candidates.iter().any(|c| !c.from_interface) {
                candidates.iter().filter(|c| !c.from_interface).collect()
            } else {
                candidates.iter().collect()
            };
            let nearest = tier.iter().map(|c| c.distance).min().unwrap_or(0);
            let mut closest = tier.iter().filter(|c| c.distance == nearest);
            let Some(chosen) = closest.next() else {
                continue;
            };
            // Calls are only dispatched on concrete types.
            if info.kind == TypeKind::Concrete
                && !chosen.from_interface
                && closest.next().is_some()
            {
                let decl = &self.operations[chosen.op.index()];
                return Err(ConfigError::AmbiguousOperation {
                    type_name: info.name.clone(),
                    signature: decl.signature(),
                });
            }
            for candidate in candidates {
                if candidate.op != chosen.op {
                    overrides.insert((info.key, candidate.op), chosen.op);
                }
            }
        }
        Ok(())
    }
}
