#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Geometry,
    Material,
    Texture,
}

/// One drawable of a surface and the GPU resources it holds. Slots are emptied as they are
/// disposed, so a half torn down object can be torn down again safely.
#[derive(Debug)]
pub struct SceneObject<R> {
    pub name: String,
    pub geometry: Option<R>,
    pub materials: Vec<R>,
    pub textures: Vec<R>,
}

impl<R> SceneObject<R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: None,
            materials: Vec::new(),
            textures: Vec::new(),
        }
    }

    pub fn attach(&mut self, kind: ResourceKind, resource: R) {
        match kind {
            ResourceKind::Geometry => self.geometry = Some(resource),
            ResourceKind::Material => self.materials.push(resource),
            ResourceKind::Texture => self.textures.push(resource),
        }
    }

    pub fn resource_count(&self) -> usize {
        usize::from(self.geometry.is_some()) + self.materials.len() + self.textures.len()
    }

    /// Moves every resource out, textures first, then materials, then geometry.
    pub(super) fn drain_resources(&mut self) -> Vec<(ResourceKind, R)> {
        let mut drained = Vec::with_capacity(self.resource_count());
        drained.extend(self.textures.drain(..).map(|texture| (ResourceKind::Texture, texture)));
        drained.extend(self.materials.drain(..).map(|material| (ResourceKind::Material, material)));
        if let Some(geometry) = self.geometry.take() {
            drained.push((ResourceKind::Geometry, geometry));
        }
        drained
    }
}

#[derive(Debug)]
pub struct SceneGraph<R> {
    objects: Vec<SceneObject<R>>,
}

impl<R> Default for SceneGraph<R> {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
        }
    }
}

impl<R> SceneGraph<R> {
    pub fn insert(&mut self, object: SceneObject<R>) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn get(&self, name: &str) -> Option<&SceneObject<R>> {
        self.objects.iter().find(|object| object.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SceneObject<R>> {
        self.objects.iter_mut().find(|object| object.name == name)
    }

    pub fn objects(&self) -> &[SceneObject<R>] {
        &self.objects
    }

    pub fn resource_count(&self) -> usize {
        self.objects.iter().map(SceneObject::resource_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Empties the graph and hands back every resource it held.
    pub(super) fn drain_resources(&mut self) -> Vec<(ResourceKind, R)> {
        let mut drained = Vec::new();
        for object in &mut self.objects {
            drained.extend(object.drain_resources());
        }
        self.objects.clear();
        drained
    }
}
