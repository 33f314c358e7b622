//! Testing utilities for SPR workspace
//!
//! Shared fixtures for declarations, capabilities and entries.

#![allow(missing_docs)]

use spr_model::{
    AnnotationRef, Capability, Constructor, Declaration, DeclarationKind, Entry, ImplementationId,
    Nesting, Position, Visibility,
};

pub fn id(name: &str) -> ImplementationId {
    ImplementationId::new(name).unwrap()
}

pub fn capability(name: &str) -> Capability {
    Capability::new(id(name))
}

pub fn annotation() -> AnnotationRef {
    AnnotationRef::new("ServiceProvider")
}

pub fn entry(name: &str) -> Entry {
    Entry::new(id(name))
}

pub fn ranked(name: &str, rank: i32) -> Entry {
    Entry::new(id(name)).with_position(Position::Ranked(rank))
}

/// Valid provider of `cap`
pub fn provider(name: &str, cap: &Capability) -> Declaration {
    let file = format!("{}.java", name.replace('.', "/"));
    Declaration::class(id(name)).implementing(cap).at(file, 1)
}

pub fn non_public_provider(name: &str, cap: &Capability) -> Declaration {
    let mut decl = provider(name, cap);
    decl.visibility = Visibility::Package;
    decl
}

pub fn abstract_provider(name: &str, cap: &Capability) -> Declaration {
    let mut decl = provider(name, cap);
    decl.is_abstract = true;
    decl
}

pub fn provider_without_no_arg_constructor(name: &str, cap: &Capability) -> Declaration {
    let mut decl = provider(name, cap);
    decl.constructors = vec![Constructor {
        visibility: Visibility::Public,
        arity: 1,
    }];
    decl
}

pub fn inner_provider(name: &str, outer: &str, cap: &Capability) -> Declaration {
    let mut decl = provider(name, cap);
    decl.nesting = Nesting::Nested {
        enclosing: id(outer),
        is_static: false,
    };
    decl
}

pub fn interface(name: &str) -> Declaration {
    let mut decl = Declaration::class(id(name));
    decl.kind = DeclarationKind::Interface;
    decl
}

/// Class that does not implement anything but itself
pub fn unrelated_class(name: &str) -> Declaration {
    Declaration::class(id(name))
}
