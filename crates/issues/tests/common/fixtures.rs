//! Static logs used across harnesses.

/// XmlFileLogger output of a small solution build: compiler, StyleCop and
/// code analysis diagnostics interleaved, plus entries that must be skipped.
pub const FULL_XML_LOG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<build started="2017-05-28T21:08:43" finished="2017-05-28T21:08:45" succeeded="false">
  <message level="high">Build started.</message>
  <project name="ClassLibrary1" file="c:\Source\Cake.Issues.MsBuild\src\ClassLibrary1\ClassLibrary1.csproj" started="2017-05-28T21:08:43">
    <target name="CoreCompile" started="2017-05-28T21:08:44">
      <task name="Csc" file="c:\Source\Cake.Issues.MsBuild\src\ClassLibrary1\ClassLibrary1.csproj">
        <message level="normal">csc.exe /noconfig</message>
        <warning code="CS0219" file="Class1.cs" line="10" column="17" endLine="10" endColumn="20">The variable 'foo' is assigned but its value is never used</warning>
        <warning code="SA1652" file="c:\Source\Cake.Issues.MsBuild\src\ClassLibrary1\Class1.cs" line="1" column="1">Enable XML documentation output</warning>
        <error code="CS1002" file="Properties\AssemblyInfo.cs" line="7" column="34">; expected</error>
        <warning code="SA1200" file="Class1.cs" line="1" column="1">Using directive must appear within a namespace declaration</warning>
        <warning code="CS8019" file="c:\Windows\Temp\.NETFramework,Version=v4.5.AssemblyAttributes.cs" line="1" column="1">Unnecessary using directive.</warning>
        <warning code="CS1591" file="Class1.cs" column="5">Missing XML comment</warning>
      </task>
    </target>
    <target name="RunCodeAnalysis">
      <task name="CodeAnalysis">
        <warning code="CA2210" line="0" column="0">Sign 'ClassLibrary1.dll' with a strong name key.</warning>
      </task>
    </target>
  </project>
</build>
"#;

/// Compressed binary log (format version 25) of the same build: build,
/// project, target and task records around the diagnostics of
/// [`FULL_XML_LOG`], a name-value list, a critical message and a record kind
/// newer than the reader. The CS0219 message is stored as a format string
/// with its argument.
pub const FULL_BINARY_LOG: &[u8] = include_bytes!("../data/solution.binlog");
