#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
//! # RustedVectorCalc
//! Educational vector calculus with symbolic derivations: triple integrals in rectangular,
//! cylindrical and spherical coordinates, curl and divergence, the theorems of Green, Stokes
//! and Gauss over a catalogue of regions, Gram-Schmidt orthogonalisation.
pub mod Utils;
pub mod symbolic;
pub mod vector_calculus;
