//! All known panoramas, grouped by linked site.

use crate::model::{FloorPlanPoint, Panorama, PanoramaId, SiteId};

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    panoramas: Vec<Panorama>,
}

/// One dot on a site's overview map.
#[derive(Clone, Debug, PartialEq)]
pub struct FloorPlanEntry {
    pub id: PanoramaId,
    pub title: String,
    pub point: FloorPlanPoint,
    pub is_active: bool,
}

impl Catalog {
    pub fn new(panoramas: Vec<Panorama>) -> Self {
        let catalog = Self { panoramas };
        for site in catalog.sites_with_multiple_active() {
            log::warn!("[scene] site {:?} has more than one active panorama", site);
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.panoramas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panoramas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Panorama> {
        self.panoramas.iter()
    }

    pub fn get(&self, id: &PanoramaId) -> Option<&Panorama> {
        self.panoramas.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PanoramaId) -> bool {
        self.get(id).is_some()
    }

    /// Panoramas sharing a site grouping (`None` is its own group).
    pub fn in_site<'a, 'b>(
        &'a self,
        site: Option<&'b SiteId>,
    ) -> impl Iterator<Item = &'a Panorama> + 'b
    where
        'a: 'b,
    {
        self.panoramas
            .iter()
            .filter(move |p| p.site_id.as_ref() == site)
    }

    pub fn active_for_site(&self, site: Option<&SiteId>) -> Option<&Panorama> {
        self.in_site(site).find(|p| p.is_active)
    }

    /// Where a visit to `site` starts: the active panorama, else the first.
    pub fn entry_point(&self, site: Option<&SiteId>) -> Option<&Panorama> {
        self.active_for_site(site)
            .or_else(|| self.in_site(site).next())
    }

    pub fn floor_plan(&self, site: Option<&SiteId>) -> Vec<FloorPlanEntry> {
        self.in_site(site)
            .filter_map(|p| {
                p.floor_plan.map(|point| FloorPlanEntry {
                    id: p.id.clone(),
                    title: p.title.clone(),
                    point,
                    is_active: p.is_active,
                })
            })
            .collect()
    }

    /// Other panoramas in the same grouping that currently carry the active flag.
    pub fn active_siblings(&self, id: Option<&PanoramaId>, site: Option<&SiteId>) -> Vec<Panorama> {
        self.in_site(site)
            .filter(|p| p.is_active && Some(&p.id) != id)
            .cloned()
            .collect()
    }

    pub fn upsert(&mut self, panorama: Panorama) {
        match self.panoramas.iter_mut().find(|p| p.id == panorama.id) {
            Some(slot) => *slot = panorama,
            None => self.panoramas.push(panorama),
        }
    }

    pub fn remove(&mut self, id: &PanoramaId) -> Option<Panorama> {
        let idx = self.panoramas.iter().position(|p| &p.id == id)?;
        Some(self.panoramas.remove(idx))
    }

    fn sites_with_multiple_active(&self) -> Vec<Option<SiteId>> {
        let mut seen: Vec<Option<&SiteId>> = Vec::new();
        let mut dup = Vec::new();
        for p in self.panoramas.iter().filter(|p| p.is_active) {
            let site = p.site_id.as_ref();
            if seen.contains(&site) {
                if !dup.contains(&site.cloned()) {
                    dup.push(site.cloned());
                }
            } else {
                seen.push(site);
            }
        }
        dup
    }
}
