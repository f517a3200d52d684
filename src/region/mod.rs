//! Litematica region decoding.
//!
//! A region is a box of voxels stored as a palette of block states plus a
//! bit-packed array of palette indices. Voxels are visited in Y, then Z, then
//! X order, which is also the order of the packed array.

mod packed;
mod properties;

pub use packed::{bits_per_entry, word_count, PackedArray};
pub use properties::{Properties, PropertyKey, PropertyValue, NONE_LITERAL};

use crate::error::{ResolveError, Result};
use crate::identifier::Identifier;
use crate::types::{BlockBounds, BlockPosition};
use glam::IVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// One palette entry: a block id and its state properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BlockEntry {
    pub identity: Identifier,
    pub properties: Properties,
}

impl BlockEntry {
    pub fn new(identity: impl Into<Identifier>, properties: Properties) -> Self {
        Self {
            identity: identity.into(),
            properties,
        }
    }

    /// Parse `name[k=v,...]` block state notation.
    pub fn from_block_string(s: &str) -> Self {
        let (name, props) = match s.split_once('[') {
            Some((name, rest)) => (name, rest.trim_end_matches(']')),
            None => (s, ""),
        };
        let properties = props
            .split(',')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.trim(), PropertyValue::parse(v.trim())))
            .collect();
        Self::new(Identifier::parse(name.trim()), properties)
    }

    pub fn is_air(&self) -> bool {
        self.identity.is_air()
    }

    /// Key identifying this exact block state.
    pub fn state_key(&self) -> String {
        format!("{}[{}]", self.identity, self.properties)
    }
}

/// A decoded voxel.
#[derive(Debug, Clone, Copy)]
pub struct Voxel<'a> {
    /// Linear index in Y, Z, X order.
    pub index: usize,
    /// Absolute grid position.
    pub position: BlockPosition,
    pub entry: &'a BlockEntry,
}

/// A single schematic region.
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    /// Signed extent. Negative components grow towards lower coordinates.
    pub size: IVec3,
    pub position: IVec3,
    pub palette: Vec<BlockEntry>,
    pub packed_states: Vec<i64>,
}

impl Region {
    pub fn new(
        name: impl Into<String>,
        size: IVec3,
        position: IVec3,
        palette: Vec<BlockEntry>,
        packed_states: Vec<i64>,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            position,
            palette,
            packed_states,
        }
    }

    /// Build a region from palette indices in Y, Z, X order.
    pub fn from_indices(
        name: impl Into<String>,
        size: IVec3,
        position: IVec3,
        palette: Vec<BlockEntry>,
        indices: &[usize],
    ) -> Self {
        let bits = bits_per_entry(palette.len());
        let values: Vec<u64> = indices.iter().map(|&i| i as u64).collect();
        let packed_states = PackedArray::encode(&values, bits);
        Self::new(name, size, position, palette, packed_states)
    }

    /// Absolute extent along each axis.
    pub fn extent(&self) -> IVec3 {
        self.size.abs()
    }

    pub fn volume(&self) -> usize {
        let e = self.extent();
        e.x as usize * e.y as usize * e.z as usize
    }

    /// Reject sizes whose extent, volume or end corner cannot be represented.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ResolveError::InvalidRegion {
            name: self.name.clone(),
            reason,
        };

        let extent = self.size.to_array().map(i32::checked_abs);
        let [Some(x), Some(y), Some(z)] = extent else {
            return Err(invalid(format!("size {} is out of range", self.size)));
        };
        (x as usize)
            .checked_mul(y as usize)
            .and_then(|xy| xy.checked_mul(z as usize))
            .ok_or_else(|| invalid(format!("volume of size {} overflows", self.size)))?;

        for (position, size) in self.position.to_array().into_iter().zip(self.size.to_array()) {
            let step = if size >= 0 { size - 1 } else { size + 1 };
            if position.checked_add(step).is_none() {
                return Err(invalid(format!(
                    "size {} at {} leaves the coordinate range",
                    self.size, self.position
                )));
            }
        }
        Ok(())
    }

    /// The corner opposite `position`.
    pub fn end_corner(&self) -> IVec3 {
        let step = |s: i32| if s >= 0 { s - 1 } else { s + 1 };
        self.position + IVec3::new(step(self.size.x), step(self.size.y), step(self.size.z))
    }

    /// Component-wise minimum of `position` and the end corner.
    pub fn min_corner(&self) -> IVec3 {
        self.position.min(self.end_corner())
    }

    pub fn bounds(&self) -> BlockBounds {
        BlockBounds {
            min: self.position.min(self.end_corner()).into(),
            max: self.position.max(self.end_corner()).into(),
        }
    }

    pub fn bits_per_entry(&self) -> u32 {
        bits_per_entry(self.palette.len())
    }

    pub fn packed(&self) -> PackedArray<'_> {
        PackedArray::new(&self.packed_states, self.bits_per_entry())
    }

    /// Local `(x, y, z)` offset of a linear index.
    pub fn local_position(&self, index: usize) -> IVec3 {
        let e = self.extent();
        let (sx, sz) = (e.x.max(1) as usize, e.z.max(1) as usize);
        let layer = sx * sz;
        let y = index / layer;
        let z = (index % layer) / sx;
        let x = index % sx;
        IVec3::new(x as i32, y as i32, z as i32)
    }

    pub fn world_position(&self, index: usize) -> BlockPosition {
        (self.min_corner() + self.local_position(index)).into()
    }

    /// Palette index stored at `index`.
    pub fn palette_index(&self, index: usize) -> Result<usize> {
        let value = self.packed().get(index).ok_or_else(|| ResolveError::InvalidRegion {
            name: self.name.clone(),
            reason: format!(
                "packed states hold {} words, too few for entry {}",
                self.packed_states.len(),
                index
            ),
        })?;
        if value >= self.palette.len() as u64 {
            return Err(ResolveError::InvalidPackedIndex {
                index,
                value,
                palette_len: self.palette.len(),
            });
        }
        Ok(value as usize)
    }

    pub fn voxel(&self, index: usize) -> Result<Voxel<'_>> {
        let palette_index = self.palette_index(index)?;
        Ok(Voxel {
            index,
            position: self.world_position(index),
            entry: &self.palette[palette_index],
        })
    }

    /// Iterate every voxel in Y, Z, X order. Calling again restarts from the beginning.
    pub fn voxels(&self) -> Voxels<'_> {
        Voxels {
            region: self,
            next: 0,
            end: self.volume(),
        }
    }

    /// Parallel counterpart of [`voxels`](Self::voxels). Order is not preserved.
    pub fn par_voxels(&self) -> impl ParallelIterator<Item = Result<Voxel<'_>>> + '_ {
        (0..self.volume()).into_par_iter().map(move |i| self.voxel(i))
    }

    /// Decode all palette indices at once.
    pub fn decode_all(&self) -> Result<Vec<usize>> {
        (0..self.volume()).map(|i| self.palette_index(i)).collect()
    }

    /// Number of voxels per palette entry.
    pub fn palette_counts(&self) -> Result<Vec<usize>> {
        let mut counts = vec![0usize; self.palette.len()];
        for index in self.decode_all()? {
            counts[index] += 1;
        }
        Ok(counts)
    }
}

/// Iterator over the voxels of a [`Region`].
#[derive(Debug, Clone)]
pub struct Voxels<'a> {
    region: &'a Region,
    next: usize,
    end: usize,
}

impl<'a> Iterator for Voxels<'a> {
    type Item = Result<Voxel<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.region.voxel(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Voxels<'_> {}

/// Something that can hand out regions by name.
pub trait RegionSource {
    fn region(&self, name: &str) -> Option<&Region>;
    fn region_names(&self) -> Vec<&str>;
}

/// All regions of a schematic, keyed by region name.
#[derive(Debug, Clone, Default)]
pub struct Regions {
    regions: BTreeMap<String, Region>,
}

impl Regions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, region: Region) {
        self.regions.insert(region.name.clone(), region);
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Parse the simplified NBT JSON form.
    ///
    /// Accepts either the full schematic object with a `Regions` key or the
    /// region map on its own.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json_value(value)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_reader(reader)?;
        Self::from_json_value(value)
    }

    fn from_json_value(mut value: serde_json::Value) -> Result<Self> {
        if let Some(inner) = value.get_mut("Regions") {
            value = inner.take();
        }
        let raw: BTreeMap<String, RawRegion> = serde_json::from_value(value)?;

        let mut regions = Regions::new();
        for (name, raw_region) in raw {
            let region = raw_region.into_region(name)?;
            log::debug!(
                "Loaded region {} ({} voxels, {} palette entries)",
                region.name,
                region.volume(),
                region.palette.len()
            );
            regions.insert(region);
        }
        Ok(regions)
    }
}

impl RegionSource for Regions {
    fn region(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    fn region_names(&self) -> Vec<&str> {
        self.regions.keys().map(String::as_str).collect()
    }
}

#[derive(Deserialize)]
struct RawVec3 {
    x: i32,
    y: i32,
    z: i32,
}

impl From<RawVec3> for IVec3 {
    fn from(v: RawVec3) -> Self {
        IVec3::new(v.x, v.y, v.z)
    }
}

#[derive(Deserialize)]
struct RawBlockState {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Properties", default)]
    properties: Properties,
}

/// A long either as a plain number or as a `[high, low]` pair of 32-bit halves.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLong {
    Pair([i64; 2]),
    Single(i64),
}

impl RawLong {
    fn value(&self) -> i64 {
        match *self {
            RawLong::Pair([high, low]) => (high << 32) | (low & 0xFFFF_FFFF),
            RawLong::Single(v) => v,
        }
    }
}

#[derive(Deserialize)]
struct RawRegion {
    #[serde(rename = "Size")]
    size: RawVec3,
    #[serde(rename = "Position")]
    position: RawVec3,
    #[serde(rename = "BlockStatePalette", default)]
    palette: Vec<RawBlockState>,
    #[serde(rename = "BlockStates", default)]
    block_states: Vec<RawLong>,
}

impl RawRegion {
    fn into_region(self, name: String) -> Result<Region> {
        let palette = self
            .palette
            .into_iter()
            .map(|state| BlockEntry::new(Identifier::parse(&state.name), state.properties))
            .collect();
        let packed_states = self.block_states.iter().map(RawLong::value).collect();
        let region = Region::new(name, self.size.into(), self.position.into(), palette, packed_states);
        region.validate()?;
        Ok(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette(names: &[&str]) -> Vec<BlockEntry> {
        names.iter().map(|n| BlockEntry::from_block_string(n)).collect()
    }

    #[test]
    fn test_iteration_order_is_y_z_x() {
        let region = Region::from_indices(
            "r",
            IVec3::new(2, 2, 2),
            IVec3::ZERO,
            palette(&["minecraft:air", "minecraft:stone"]),
            &[0, 1, 1, 0, 0, 0, 1, 1],
        );

        let positions: Vec<_> = region
            .voxels()
            .map(|v| v.unwrap().position)
            .collect();
        assert_eq!(positions[0], BlockPosition::new(0, 0, 0));
        assert_eq!(positions[1], BlockPosition::new(1, 0, 0));
        assert_eq!(positions[2], BlockPosition::new(0, 0, 1));
        assert_eq!(positions[4], BlockPosition::new(0, 1, 0));

        let stone: Vec<_> = region
            .voxels()
            .map(|v| v.unwrap())
            .filter(|v| !v.entry.is_air())
            .map(|v| v.position)
            .collect();
        assert_eq!(
            stone,
            vec![
                BlockPosition::new(1, 0, 0),
                BlockPosition::new(0, 0, 1),
                BlockPosition::new(0, 1, 1),
                BlockPosition::new(1, 1, 1),
            ]
        );
    }

    #[test]
    fn test_negative_size_shifts_min_corner() {
        let region = Region::new(
            "r",
            IVec3::new(-4, 3, 2),
            IVec3::new(10, 10, 10),
            palette(&["minecraft:stone"]),
            vec![0; 2],
        );

        assert_eq!(region.end_corner(), IVec3::new(7, 12, 11));
        assert_eq!(region.min_corner(), IVec3::new(7, 10, 10));
        assert_eq!(region.volume(), 24);
        assert_eq!(region.world_position(0), BlockPosition::new(7, 10, 10));
        assert_eq!(region.world_position(23), BlockPosition::new(10, 12, 11));
        assert_eq!(region.bounds().dimensions(), IVec3::new(4, 3, 2));
    }

    #[test]
    fn test_out_of_range_palette_index() {
        // Two-entry palette, but every 2-bit entry reads 3.
        let region = Region::new(
            "r",
            IVec3::new(1, 1, 1),
            IVec3::ZERO,
            palette(&["minecraft:air", "minecraft:stone"]),
            vec![-1],
        );

        let result = region.voxels().next().unwrap();
        assert!(matches!(
            result,
            Err(ResolveError::InvalidPackedIndex { index: 0, value: 3, palette_len: 2 })
        ));
    }

    #[test]
    fn test_missing_words_is_invalid_region() {
        let region = Region::new(
            "r",
            IVec3::new(4, 4, 4),
            IVec3::ZERO,
            palette(&["minecraft:air"]),
            vec![0],
        );
        assert!(matches!(
            region.decode_all(),
            Err(ResolveError::InvalidRegion { .. })
        ));
    }

    #[test]
    fn test_voxels_restart_and_len() {
        let region = Region::from_indices(
            "r",
            IVec3::new(3, 1, 1),
            IVec3::ZERO,
            palette(&["minecraft:air", "minecraft:stone"]),
            &[1, 0, 1],
        );
        let voxels = region.voxels();
        assert_eq!(voxels.len(), 3);
        assert_eq!(region.voxels().count(), region.voxels().count());
        assert_eq!(region.palette_counts().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_par_voxels_matches_sequential() {
        let indices: Vec<usize> = (0..60).map(|i| i % 5).collect();
        let region = Region::from_indices(
            "r",
            IVec3::new(5, 3, 4),
            IVec3::new(-2, 0, 7),
            palette(&["air", "stone", "dirt", "oak_planks", "glass"]),
            &indices,
        );

        let mut parallel: Vec<_> = region
            .par_voxels()
            .map(|v| v.map(|v| (v.index, v.position)))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        parallel.sort_by_key(|(i, _)| *i);
        let sequential: Vec<_> = region
            .voxels()
            .map(|v| v.map(|v| (v.index, v.position)).unwrap())
            .collect();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_regions_from_simplified_nbt() {
        let json = r#"{
            "Regions": {
                "main": {
                    "Size": { "x": 16, "y": 1, "z": 1 },
                    "Position": { "x": 0, "y": 0, "z": 0 },
                    "BlockStatePalette": [
                        { "Name": "minecraft:air" },
                        { "Name": "minecraft:spruce_log", "Properties": { "axis": "y" } }
                    ],
                    "BlockStates": [[0, 4], 0]
                }
            }
        }"#;

        let regions = Regions::from_json_str(json).unwrap();
        assert_eq!(regions.region_names(), vec!["main"]);

        let region = regions.region("main").unwrap();
        let entries: Vec<_> = region.voxels().map(|v| v.unwrap().entry).collect();
        assert!(entries[0].is_air());
        assert_eq!(entries[1].identity.file(), Some("spruce_log"));
        assert!(entries[1].properties.matches("axis", "y"));
        assert!(entries[2].is_air());
    }

    fn region_json(size: (i64, i64, i64), position: (i64, i64, i64)) -> String {
        format!(
            r#"{{ "r": {{
                "Size": {{ "x": {}, "y": {}, "z": {} }},
                "Position": {{ "x": {}, "y": {}, "z": {} }},
                "BlockStatePalette": [{{ "Name": "minecraft:air" }}],
                "BlockStates": []
            }} }}"#,
            size.0, size.1, size.2, position.0, position.1, position.2
        )
    }

    #[test]
    fn test_unrepresentable_sizes_are_invalid_region() {
        let cases = [
            ((i32::MIN as i64, 1, 1), (0, 0, 0)),
            ((i32::MAX as i64, i32::MAX as i64, i32::MAX as i64), (0, 0, 0)),
            ((2, 1, 1), (i32::MAX as i64, 0, 0)),
            ((1, 1, -2), (0, 0, i32::MIN as i64)),
        ];
        for (size, position) in cases {
            let result = Regions::from_json_str(&region_json(size, position));
            assert!(
                matches!(result, Err(ResolveError::InvalidRegion { ref name, .. }) if name == "r"),
                "size {:?} at {:?}",
                size,
                position
            );
        }

        assert!(Regions::from_json_str(&region_json((-4, 3, 2), (10, 10, 10))).is_ok());
        assert!(Regions::from_json_str(&region_json((1, 1, 1), (i32::MAX as i64, 0, 0))).is_ok());
    }

    #[test]
    fn test_long_pair_combines_halves() {
        assert_eq!(RawLong::Pair([-1, -1]).value(), -1);
        assert_eq!(RawLong::Pair([0, -1]).value(), 0xFFFF_FFFF);
        assert_eq!(RawLong::Pair([1, 0]).value(), 1 << 32);
    }

    #[test]
    fn test_block_string_parsing() {
        let entry = BlockEntry::from_block_string("minecraft:oak_stairs[facing=east,half=top]");
        assert_eq!(entry.identity.file(), Some("oak_stairs"));
        assert!(entry.properties.matches("facing", "east"));
        assert_eq!(
            entry.state_key(),
            "minecraft:oak_stairs[facing=east,half=top]"
        );
    }
}
