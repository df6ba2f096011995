use std::ops::Range;

/// Word address into scratch memory.
pub type Addr = u32;

/// Handle to a single scratch word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScalarReg {
    addr: Addr,
}

impl ScalarReg {
    pub(crate) fn new(addr: Addr) -> Self {
        Self { addr }
    }

    pub fn addr(self) -> Addr {
        self.addr
    }
}

/// Handle to a run of `len` consecutive scratch words.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VectorReg {
    addr: Addr,
    len: u32,
}

impl VectorReg {
    pub(crate) fn new(addr: Addr, len: u32) -> Self {
        Self { addr, len }
    }

    pub fn addr(self) -> Addr {
        self.addr
    }

    pub fn len(self) -> u32 {
        self.len
    }

    /// Scalar view of one lane. This is the only way two register handles
    /// can alias; hazard tracking works on word addresses, so a lane and
    /// its parent vector order against each other like any other overlap.
    pub fn lane(self, i: u32) -> ScalarReg {
        assert!(i < self.len, "lane {} out of range for vector of {} words", i, self.len);
        ScalarReg::new(self.addr + i)
    }
}

/// Either register shape, as accepted by the emission API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegRef {
    Scalar(ScalarReg),
    Vector(VectorReg),
}

impl RegRef {
    pub fn base(self) -> Addr {
        match self {
            RegRef::Scalar(r) => r.addr(),
            RegRef::Vector(r) => r.addr(),
        }
    }

    pub fn len(self) -> u32 {
        match self {
            RegRef::Scalar(_) => 1,
            RegRef::Vector(r) => r.len(),
        }
    }

    /// Word addresses covered by this register.
    pub fn addrs(self) -> Range<Addr> {
        self.base()..self.base() + self.len()
    }
}

impl From<ScalarReg> for RegRef {
    fn from(r: ScalarReg) -> Self {
        RegRef::Scalar(r)
    }
}

impl From<VectorReg> for RegRef {
    fn from(r: VectorReg) -> Self {
        RegRef::Vector(r)
    }
}
