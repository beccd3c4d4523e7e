//! Explicit packed wire layout for particles, ghosts, and header counts.
//!
//! The original C transport (`original_source/ghosts.c`) sends
//! `MPI_BYTE` blobs that are a raw `memcpy` of `struct Particle`/`struct
//! Ghost`. That is only safe because sender and receiver share one
//! binary's memory layout; it is not something a Rust port should repeat.
//! Every record here has a named field order and a fixed little-endian
//! width instead.

use crate::particle::Ghost;
use crate::particle::Particle;
use crate::particle::ParticleId;
use crate::particle::TypeTag;

pub const PARTICLE_RECORD_LEN: usize = 8 + 4 + 24 + 12 + 24 + 24 + 8 + 4;
pub const GHOST_RECORD_LEN: usize = 8 + 4 + 24 + 8;

pub fn encode_particle(p: &Particle, out: &mut Vec<u8>) {
    out.extend_from_slice(&p.identity.to_le_bytes());
    out.extend_from_slice(&p.type_tag.to_le_bytes());
    for v in p.pos {
        out.extend_from_slice(&v.to_le_bytes());
    }
    for v in p.image {
        out.extend_from_slice(&v.to_le_bytes());
    }
    for v in p.vel {
        out.extend_from_slice(&v.to_le_bytes());
    }
    for v in p.force {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out.extend_from_slice(&p.charge.to_le_bytes());
    out.extend_from_slice(&(p.bonds.len() as u32).to_le_bytes());
}

/// Decodes one fixed-size particle record starting at `bytes[0..]`. Bonds
/// are filled in separately by the caller from the bond-int stream; the
/// returned `n_bonds` is how many partner identities to pull from that
/// parallel stream.
pub fn decode_particle(bytes: &[u8]) -> (Particle, usize, usize) {
    let mut off = 0;
    let mut read_u64 = || {
        let v = u64::from_le_bytes(bytes[off..off + 8].try_into().unwrap());
        off += 8;
        v
    };
    let identity: ParticleId = read_u64();
    let type_tag = {
        let v = TypeTag::from_le_bytes(bytes[off..off + 4].try_into().unwrap());
        off += 4;
        v
    };
    let mut read_f64 = |off: &mut usize| {
        let v = f64::from_le_bytes(bytes[*off..*off + 8].try_into().unwrap());
        *off += 8;
        v
    };
    let mut read_i32 = |off: &mut usize| {
        let v = i32::from_le_bytes(bytes[*off..*off + 4].try_into().unwrap());
        *off += 4;
        v
    };
    let pos = [read_f64(&mut off), read_f64(&mut off), read_f64(&mut off)];
    let image = [read_i32(&mut off), read_i32(&mut off), read_i32(&mut off)];
    let vel = [read_f64(&mut off), read_f64(&mut off), read_f64(&mut off)];
    let force = [read_f64(&mut off), read_f64(&mut off), read_f64(&mut off)];
    let charge = read_f64(&mut off);
    let n_bonds = u32::from_le_bytes(bytes[off..off + 4].try_into().unwrap()) as usize;
    off += 4;
    let mut p = Particle::new(identity, pos);
    p.type_tag = type_tag;
    p.image = image;
    p.vel = vel;
    p.force = force;
    p.charge = charge;
    (p, off, n_bonds)
}

pub fn encode_ghost(g: &Ghost, out: &mut Vec<u8>) {
    out.extend_from_slice(&g.identity.to_le_bytes());
    out.extend_from_slice(&g.type_tag.to_le_bytes());
    for v in g.pos {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out.extend_from_slice(&g.charge.to_le_bytes());
}

pub fn decode_ghost(bytes: &[u8]) -> (Ghost, usize) {
    let mut off = 0;
    let identity = u64::from_le_bytes(bytes[off..off + 8].try_into().unwrap());
    off += 8;
    let type_tag = i32::from_le_bytes(bytes[off..off + 4].try_into().unwrap());
    off += 4;
    let mut read_f64 = |off: &mut usize| {
        let v = f64::from_le_bytes(bytes[*off..*off + 8].try_into().unwrap());
        *off += 8;
        v
    };
    let pos = [read_f64(&mut off), read_f64(&mut off), read_f64(&mut off)];
    let charge = read_f64(&mut off);
    (
        Ghost {
            identity,
            type_tag,
            pos,
            charge,
        },
        off,
    )
}

pub fn encode_u32_header(values: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn decode_u32_header(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

/// Position/force double stream used by ghost refresh: no header, just
/// `3 * count` little-endian doubles in cell-major order.
pub fn encode_f64_stream(values: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 8);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn decode_f64_stream(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

pub fn encode_bond_ints(bonds: &[ParticleId]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bonds.len() * 8);
    for b in bonds {
        out.extend_from_slice(&b.to_le_bytes());
    }
    out
}

pub fn decode_bond_ints(bytes: &[u8], count: usize) -> Vec<ParticleId> {
    bytes
        .chunks_exact(8)
        .take(count)
        .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn particle_round_trips_all_fields_except_bonds() {
        let mut p = Particle::new(42, [1.0, 2.0, 3.0]);
        p.type_tag = 5;
        p.image = [1, -1, 0];
        p.vel = [0.1, 0.2, 0.3];
        p.force = [1.0, 2.0, 3.0];
        p.charge = -1.5;
        p.bonds = vec![7, 8, 9];

        let mut bytes = Vec::new();
        encode_particle(&p, &mut bytes);
        assert_eq!(bytes.len(), PARTICLE_RECORD_LEN);
        let (decoded, consumed, n_bonds) = decode_particle(&bytes);
        assert_eq!(consumed, PARTICLE_RECORD_LEN);
        assert_eq!(decoded.identity, p.identity);
        assert_eq!(decoded.type_tag, p.type_tag);
        assert_eq!(decoded.pos, p.pos);
        assert_eq!(decoded.image, p.image);
        assert_eq!(decoded.vel, p.vel);
        assert_eq!(decoded.force, p.force);
        assert_eq!(decoded.charge, p.charge);
        assert_eq!(decoded.bonds.len(), 0);
        assert_eq!(n_bonds, p.bonds.len());
    }

    #[test]
    fn ghost_round_trips() {
        let g = Ghost {
            identity: 3,
            type_tag: 2,
            pos: [1.0, -2.0, 3.5],
            charge: 0.25,
        };
        let mut bytes = Vec::new();
        encode_ghost(&g, &mut bytes);
        assert_eq!(bytes.len(), GHOST_RECORD_LEN);
        let (decoded, consumed) = decode_ghost(&bytes);
        assert_eq!(consumed, GHOST_RECORD_LEN);
        assert_eq!(decoded, g);
    }

    #[test]
    fn bond_ints_round_trip_in_order() {
        let bonds = vec![1u64, 2, 3, 4];
        let bytes = encode_bond_ints(&bonds);
        assert_eq!(decode_bond_ints(&bytes, bonds.len()), bonds);
    }

    #[test]
    fn f64_stream_round_trips() {
        let values = vec![1.5f64, -2.25, 0.0, 100.125];
        let bytes = encode_f64_stream(&values);
        assert_eq!(decode_f64_stream(&bytes), values);
    }

    #[test]
    fn u32_header_round_trips() {
        let values = vec![0u32, 1, 5, 100, u32::MAX];
        let bytes = encode_u32_header(&values);
        assert_eq!(decode_u32_header(&bytes), values);
    }
}
