//! Binaural spatial audio for games and interactive applications.
//!
//! ## Features
//!
//! - Per-source binaural rendering built from plain filtering and delay: interaural time and level
//!   differences, head-shadow and front/back shelving, distance roll-off.
//! - Occlusion and obfuscation filtering driven by a host-provided ray caster.
//! - A small DSP toolkit: fractional delay line, biquads with cookbook designers, one-pole
//!   filters, comb and all-pass filters, wavetable oscillator, RMS detector.
//! - Effects: Schroeder reverb, tremolo, echo, distortion and biquad filter stages.
//!
//! ## Threading
//!
//! A [`source::SpatialSource`] lives on the audio thread and is fed one block at a time. The
//! application (frame) thread resolves geometry with [`direction::DirectionResolver`] and writes
//! the result into the source's [`params::SpatialControls`], which are plain atomics. Nothing on
//! the audio path locks, allocates or fails.
//!
//! ## Examples
//!
//! ```no_run
//! use binaural_sound::{
//!     algebra::Vector3,
//!     direction::DirectionResolver,
//!     listener::Listener,
//!     source::SpatialSourceBuilder,
//! };
//!
//! let mut source = SpatialSourceBuilder::new(48000).build().unwrap();
//! let controls = source.controls();
//!
//! // Frame thread.
//! let listener = Listener::new();
//! let mut resolver = DirectionResolver::new();
//! let direction = resolver.resolve(&listener, Vector3::new(2.0, 0.0, 1.0));
//! controls.set_direction(&direction);
//!
//! // Audio thread.
//! let mut block = vec![0.0f32; 512 * 2];
//! source.process_interleaved(&mut block, 2);
//! ```
//!
//! Other examples can be found in `./examples` folder. Make sure you run them with `--release` flag.

#![warn(missing_docs)]

pub mod attenuation;
pub mod direction;
pub mod dsp;
pub mod effects;
pub mod error;
pub mod listener;
pub mod occlusion;
pub mod params;
pub mod renderer;
pub mod source;

// Reexport some modules because there some types of them in public API.
pub use fyrox_core::algebra;
pub use fyrox_core::math;
