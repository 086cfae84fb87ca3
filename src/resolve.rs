//! Property resolution: field types to `Property` trees.
//!
//! Classes are resolved depth first. A class reached again while still in
//! progress is a forward reference: the nested-class variant only needs the
//! class's routine names, which are known up front, so cycles resolve fine.
mod adapter;

use std::collections::HashMap;

use serde::Serialize;

use crate::config::{Config, ContainerShape};
use crate::error::{Failure, SynthError};
use crate::ir::{TypePath, TypeRef};
use crate::model::{ClassModel, FieldModel, UnitModel};
use crate::property::{Pointer, Primitive, Property, PropertyKind, TaggedImplementer};
use crate::registry::{AdapterHandle, AdapterKey, AdapterRegistry};

use adapter::Match;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug)]
pub struct ResolvedUnit {
    pub config: Config,
    /// Same order as the unit's classes.
    pub classes: Vec<ResolvedClass>,
    pub registry: AdapterRegistry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedClass {
    pub path: TypePath,
    pub write_routine: String,
    pub read_routine: String,
    pub singleton: bool,
    pub tuple: bool,
    pub fields: Vec<ResolvedField>,
    /// Transitively: any reachable slot needs the ambient context to decode.
    pub requires_context: bool,
    /// Adapter statics this class's routines use, first use first.
    pub adapters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedField {
    /// Struct member: an identifier, or a position for tuple structs.
    pub member: String,
    pub getter: Option<String>,
    /// `None` when the field is excluded from the wire.
    pub property: Option<Property>,
}

/// Serializable view of a resolved unit: the property trees and the adapter
/// declarations the unit would get.
#[derive(Debug, Serialize)]
pub struct Plan<'u> {
    pub adapters: Vec<AdapterHandle>,
    pub classes: &'u [ResolvedClass],
}

enum ClassState {
    InProgress,
    Done(ResolvedClass),
}

struct Resolver<'u> {
    unit: &'u UnitModel,
    registry: AdapterRegistry,
    states: HashMap<TypePath, ClassState>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

/// Resolve every class in `unit`. All or nothing: the first error aborts.
pub fn resolve_unit(unit: &UnitModel) -> Result<ResolvedUnit, SynthError> {
    validate_identifiers(unit)?;
    check_duplicate_routines(unit)?;

    let mut resolver = Resolver { unit, registry: AdapterRegistry::new(), states: HashMap::new() };
    for class in &unit.classes {
        resolver.resolve_class(class)?;
    }
    Ok(resolver.finish())
}

impl ResolvedUnit {
    pub fn class(&self, path: &TypePath) -> Option<&ResolvedClass> {
        self.classes.iter().find(|c| c.path.same_as(path.as_str()))
    }

    pub fn adapters(&self) -> Vec<AdapterHandle> { self.registry.handles() }

    pub fn plan(&self) -> Plan<'_> {
        Plan { adapters: self.adapters(), classes: &self.classes }
    }
}

impl ResolvedClass {
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.fields.iter().filter_map(|f| f.property.as_ref())
    }
}

impl<'u> Resolver<'u> {
    fn config(&self) -> &'u Config { &self.unit.config }

    fn resolve_class(&mut self, class: &'u ClassModel) -> Result<(), SynthError> {
        match self.states.get(&class.path) {
            Some(ClassState::InProgress) => {
                log::trace!("forward reference to {}", class.path);
                return Ok(());
            }
            Some(ClassState::Done(_)) => return Ok(()),
            None => {}
        }
        check_manual_conflicts(class)?;
        self.states.insert(class.path.clone(), ClassState::InProgress);

        let mut fields = Vec::with_capacity(class.fields.len());
        if !class.singleton {
            for field in &class.fields {
                fields.push(self.resolve_field(class, field)?);
            }
        }

        let mut adapters: Vec<String> = Vec::new();
        for property in fields.iter().filter_map(|f: &ResolvedField| f.property.as_ref()) {
            for handle in property.adapters() {
                if !adapters.contains(&handle.ident) {
                    adapters.push(handle.ident.clone());
                }
            }
        }

        let resolved = ResolvedClass {
            path: class.path.clone(),
            write_routine: class.write_routine(),
            read_routine: class.read_routine(),
            singleton: class.singleton,
            tuple: class.is_tuple(),
            fields,
            requires_context: class.requires_context,
            adapters,
        };
        log::debug!("resolved {} ({} field(s))", class.path, resolved.fields.len());
        self.states.insert(class.path.clone(), ClassState::Done(resolved));
        Ok(())
    }

    fn resolve_field(&mut self, class: &ClassModel, field: &FieldModel) -> Result<ResolvedField, SynthError> {
        let member = field.name.clone();
        let getter = field.getter.clone();
        if self.config().is_excluded(&field.annotations) {
            log::debug!("{}.{}: excluded", class.path, field.name);
            return Ok(ResolvedField { member, getter, property: None });
        }

        let property = self
            .resolve_property(local_name(field), &field.ty)
            .map_err(|f| f.at(&class.path, &field.name))?;
        log::debug!("{}.{}: {} as {}", class.path, field.name, field.ty, property.variant_label());
        Ok(ResolvedField { member, getter, property: Some(property) })
    }

    fn resolve_property(&mut self, name: String, ty: &TypeRef) -> Result<Property, Failure> {
        let (nullable, ty) = match ty.upper_bound() {
            TypeRef::Nullable(inner) => (true, inner.upper_bound()),
            other => (false, other),
        };
        if let TypeRef::Nullable(_) = ty {
            return Err(Failure::unresolved(ty, "a nullable slot cannot itself hold a nullable value"));
        }
        let kind = self.resolve_kind(&name, ty, nullable)?;
        log::trace!("{name}: {ty} -> {kind:?}");
        Ok(Property { name, ty: ty.normalized(), nullable, kind })
    }

    /// The ordered classification. First match wins.
    fn resolve_kind(&mut self, name: &str, ty: &TypeRef, nullable: bool) -> Result<PropertyKind, Failure> {
        let config = self.config();
        let unit = self.unit;
        let path = ty.raw_path();
        let bare = ty.args().is_empty();

        // 1. primitives; nullable ones are the boxed form
        if let Some(primitive) = path.filter(|_| bare).and_then(Primitive::from_path) {
            return Ok(if nullable {
                PropertyKind::Boxed { primitive }
            } else {
                PropertyKind::Primitive { primitive }
            });
        }

        // 2. text
        if let Some(text) = config.textual_kind(ty) {
            return Ok(PropertyKind::Textual { text });
        }

        // 3. arrays
        if let TypeRef::Array(elem) = ty {
            let component = self.resolve_property(child(name, "component"), elem)?;
            return Ok(PropertyKind::Array { component: Box::new(component) });
        }

        // 4. container families
        if let Some(family) = path.and_then(|p| config.container_family(p)) {
            let args = ty.args();
            let expected = family.shape.arity();
            if args.len() != expected {
                return Err(Failure::ContainerArity {
                    container: path.cloned().unwrap_or_else(|| TypePath::new(&family.canonical)),
                    expected,
                    found: args.len(),
                });
            }
            let family = family.clone();
            return Ok(match family.shape {
                ContainerShape::List | ContainerShape::Set => {
                    let item = self.resolve_property(child(name, "item"), &args[0])?;
                    PropertyKind::Collection { family, item: Box::new(item) }
                }
                ContainerShape::Map => {
                    let key = self.resolve_property(child(name, "key"), &args[0])?;
                    let value = self.resolve_property(child(name, "value"), &args[1])?;
                    PropertyKind::Map { family, key: Box::new(key), value: Box::new(value) }
                }
                ContainerShape::SparseIndexed => {
                    let value = self.resolve_property(child(name, "value"), &args[0])?;
                    PropertyKind::SparseIndexedMap { family, value: Box::new(value) }
                }
            });
        }

        // 5. fieldless enums
        if let Some(decl) = path.filter(|_| bare).and_then(|p| unit.enum_decl(p)) {
            if !decl.variants.is_empty() {
                return Ok(PropertyKind::Enumerated { path: decl.path.clone(), variants: decl.variants.clone() });
            }
        }

        // 6. data classes, optionally behind Box/Rc/Arc
        if let Some((class, pointer)) = self.data_class_target(ty) {
            self.resolve_class(class)?;
            return Ok(PropertyKind::NestedDataClass { class: class.path.clone(), pointer });
        }

        // 7. interfaces
        if let Some(decl) = path.filter(|_| bare).and_then(|p| unit.interface(p)) {
            let extras = config.extra_implementers.iter()
                .filter(|(iface, _)| decl.path.same_as(iface))
                .flat_map(|(_, list)| list.iter());
            let mut implementers = Vec::new();
            for (i, imp) in decl.implementers.iter().chain(extras).enumerate() {
                let Some(target) = unit.class(&imp.class) else {
                    return Err(Failure::MissingClass { interface: decl.path.clone(), implementer: imp.class.clone() });
                };
                let property = self.resolve_property(
                    child(name, &crate::model::snake_case(imp.variant.trim_start_matches("r#"))),
                    &TypeRef::Path { path: target.path.clone(), args: Vec::new() },
                )?;
                let tag = i32::try_from(i + 1)
                    .map_err(|_| Failure::unresolved(ty, "too many implementers for an i32 tag"))?;
                implementers.push(TaggedImplementer { tag, variant: imp.variant.clone(), property });
            }
            if implementers.is_empty() && decl.fallback.is_none() {
                return Err(Failure::unresolved(ty, "interface has no implementers and no fallback variant"));
            }
            return Ok(PropertyKind::PolymorphicInterface {
                interface: decl.path.clone(),
                implementers,
                fallback: decl.fallback.clone(),
            });
        }

        // 8. user adapters
        self.resolve_adapter(ty)
    }

    fn data_class_target(&self, ty: &TypeRef) -> Option<(&'u ClassModel, Option<Pointer>)> {
        let TypeRef::Path { path, args } = ty else { return None };
        if args.is_empty() {
            return self.unit.class(path).map(|c| (c, None));
        }
        let pointer = Pointer::from_path(path)?;
        match args.as_slice() {
            [TypeRef::Path { path: inner, args: inner_args }] if inner_args.is_empty() => {
                self.unit.class(inner).map(|c| (c, Some(pointer)))
            }
            _ => None,
        }
    }

    fn resolve_adapter(&mut self, ty: &TypeRef) -> Result<PropertyKind, Failure> {
        let mut mismatch: Option<Failure> = None;
        for candidate in &self.config().adapter_candidates {
            match adapter::match_candidate(candidate, ty) {
                Match::NotApplicable => continue,
                Match::Mismatch(reason) => {
                    log::trace!("adapter {} rejected for {ty}: {reason}", candidate.provider);
                    mismatch.get_or_insert(Failure::AdapterArity {
                        adapter: candidate.provider.clone(),
                        ty: ty.clone(),
                        reason,
                    });
                }
                Match::Bound(args) => {
                    let handle = self.registry.register(AdapterKey::new(candidate.provider.clone(), args));
                    return Ok(PropertyKind::AdapterDelegated { adapter: handle });
                }
            }
        }
        Err(mismatch.unwrap_or_else(|| {
            Failure::unresolved(ty, "not a primitive, text, array, container, enum, data class or interface, and no adapter handles it")
        }))
    }

    fn finish(mut self) -> ResolvedUnit {
        let mut classes: Vec<ResolvedClass> = Vec::with_capacity(self.unit.classes.len());
        for model in &self.unit.classes {
            if let Some(ClassState::Done(class)) = self.states.remove(&model.path) {
                classes.push(class);
            }
        }
        propagate_context(&mut classes);
        ResolvedUnit { config: self.unit.config.clone(), classes, registry: self.registry }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Fixpoint over nested-class edges: a class needs the context if any of its
/// own slots do, or any class it decodes through does.
fn propagate_context(classes: &mut [ResolvedClass]) {
    for class in classes.iter_mut() {
        let own = class.properties().any(Property::requires_context);
        class.requires_context |= own;
    }
    let edges: Vec<Vec<usize>> = classes
        .iter()
        .map(|class| {
            class
                .properties()
                .flat_map(Property::nested_classes)
                .filter_map(|target| classes.iter().position(|c| c.path == *target))
                .collect()
        })
        .collect();

    loop {
        let mut changed = false;
        for (i, targets) in edges.iter().enumerate() {
            if !classes[i].requires_context && targets.iter().any(|&t| classes[t].requires_context) {
                log::trace!("{} needs the decode context through a nested class", classes[i].path);
                classes[i].requires_context = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

fn check_manual_conflicts(class: &ClassModel) -> Result<(), SynthError> {
    let generated = [class.write_routine(), class.read_routine()];
    for existing in &class.existing_routines {
        if generated.contains(&existing.name) {
            return Err(SynthError::ManualImplementationConflict {
                class: class.path.clone(),
                routine: existing.name.clone(),
                location: existing.location.clone(),
            });
        }
    }
    Ok(())
}

fn check_duplicate_routines(unit: &UnitModel) -> Result<(), SynthError> {
    let mut seen: HashMap<String, &TypePath> = HashMap::new();
    for class in &unit.classes {
        let stem = class.stem();
        if let Some(other) = seen.insert(stem.clone(), &class.path) {
            let other = other.clone();
            if other == class.path {
                continue;
            }
            return Err(SynthError::DuplicateRoutine { class: class.path.clone(), other, routine: class.write_routine() });
        }
    }
    Ok(())
}

/// Names that end up as identifiers in generated code must parse as such.
fn validate_identifiers(unit: &UnitModel) -> Result<(), SynthError> {
    let path = |context: &str, p: &str| -> Result<(), SynthError> {
        let ok = syn::parse_str::<syn::Path>(p)
            .is_ok_and(|parsed| parsed.segments.iter().all(|s| s.arguments.is_none()));
        if ok { Ok(()) } else { Err(invalid(context, p)) }
    };
    let ident = |context: &str, i: &str| -> Result<(), SynthError> {
        if syn::parse_str::<syn::Ident>(i).is_ok() { Ok(()) } else { Err(invalid(context, i)) }
    };

    path("runtime_path", &unit.config.runtime_path)?;
    for candidate in &unit.config.adapter_candidates {
        path("adapter provider", candidate.provider.as_str())?;
    }
    for family in &unit.config.containers {
        path("container", &family.canonical)?;
        ident(&family.canonical, &family.insert)?;
    }
    for decl in &unit.enums {
        path("enum", decl.path.as_str())?;
        for variant in &decl.variants {
            ident(decl.path.as_str(), variant)?;
        }
    }
    for decl in &unit.interfaces {
        path("interface", decl.path.as_str())?;
        let extras = unit.config.extra_implementers.iter()
            .filter(|(iface, _)| decl.path.same_as(iface))
            .flat_map(|(_, list)| list.iter());
        for imp in decl.implementers.iter().chain(extras) {
            ident(decl.path.as_str(), &imp.variant)?;
        }
        if let Some(fallback) = &decl.fallback {
            ident(decl.path.as_str(), fallback)?;
        }
    }
    for class in &unit.classes {
        path("class", class.path.as_str())?;
        ident(class.path.as_str(), &class.write_routine())?;
        for field in &class.fields {
            if !field.is_positional() {
                ident(class.path.as_str(), &field.name)?;
            }
            if let Some(getter) = &field.getter {
                ident(class.path.as_str(), getter)?;
            }
        }
    }
    Ok(())
}

fn invalid(context: &str, ident: &str) -> SynthError {
    SynthError::InvalidIdentifier { context: context.to_string(), ident: ident.to_string() }
}

/// Local-variable stem for a field: raw identifiers lose their `r#`,
/// keywords gain a trailing `_`, positions become `field_<n>`.
fn local_name(field: &FieldModel) -> String {
    if field.is_positional() {
        return format!("field_{}", field.name);
    }
    let name = field.name.trim_start_matches("r#");
    if syn::parse_str::<syn::Ident>(name).is_ok() {
        name.to_string()
    } else {
        format!("{name}_")
    }
}

fn child(name: &str, role: &str) -> String {
    format!("{name}_{role}")
}

// ------------------------------- Tests ------------------------------------ //
